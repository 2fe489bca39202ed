use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use listing_harvest::viewer::{ViewFilter, ViewFormat, ViewOptions};
use listing_harvest::{HarvestConfig, HarvestQuery};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "listing-harvest")]
#[command(about = "Collects classifieds listings into a local JSON store")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch new listings for a search and add them to the store
    Harvest(HarvestArgs),
    /// Show the stored listings
    View(ViewArgs),
}

#[derive(ClapArgs, Debug)]
pub struct HarvestArgs {
    /// Search text
    #[arg(short, long)]
    pub query: String,

    /// Postal code or city to search around
    #[arg(short, long)]
    pub location: String,

    /// Search radius in kilometres
    #[arg(short, long, default_value = "5")]
    pub radius: String,

    /// Lower price bound
    #[arg(long)]
    pub min_price: Option<u64>,

    /// Upper price bound
    #[arg(long)]
    pub max_price: Option<u64>,

    /// Number of result pages to request
    #[arg(long, default_value_t = 1)]
    pub page_count: u32,

    /// Keyword that marks a listing as blacklisted (repeatable, comma separated)
    #[arg(short, long = "blacklist", value_delimiter = ',')]
    pub blacklist: Vec<String>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the store file location
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Flush the store after this many processed listings
    #[arg(long)]
    pub save_every: Option<usize>,

    /// Re-fetch listings stored as failed by an earlier run
    #[arg(long)]
    pub retry_failed: bool,
}

impl HarvestArgs {
    pub fn query(&self) -> HarvestQuery {
        HarvestQuery::new(&self.query, &self.location)
            .with_radius(&self.radius)
            .with_price_range(self.min_price, self.max_price)
            .with_page_count(self.page_count)
    }

    /// Apply command line overrides on top of a loaded configuration
    pub fn apply(&self, mut config: HarvestConfig) -> HarvestConfig {
        config.blacklist.extend(&self.blacklist);
        if let Some(store) = &self.store {
            config.store_path = store.clone();
        }
        if let Some(api_url) = &self.api_url {
            config.api_base_url = api_url.clone();
        }
        if let Some(save_every) = self.save_every {
            config.save_every = save_every;
        }
        if self.retry_failed {
            config.retry_failed = true;
        }
        config
    }
}

#[derive(ClapArgs, Debug)]
pub struct ViewArgs {
    /// Store file to read
    #[arg(long, default_value = listing_harvest::store::DEFAULT_STORE_PATH)]
    pub store: PathBuf,

    /// Which listings to show
    #[arg(short, long, value_enum, default_value_t = FilterArg::NotBlacklisted)]
    pub filter: FilterArg,

    /// Output format
    #[arg(long, value_enum, default_value_t = FormatArg::Table)]
    pub format: FormatArg,

    /// Add a column with the first image of each listing
    #[arg(long)]
    pub images: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FilterArg {
    Blacklisted,
    NotBlacklisted,
    Failed,
    All,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Table,
    Json,
}

impl ViewArgs {
    /// Convert from CLI arguments to viewer options
    pub fn options(&self) -> ViewOptions {
        ViewOptions {
            filter: match self.filter {
                FilterArg::Blacklisted => ViewFilter::Blacklisted,
                FilterArg::NotBlacklisted => ViewFilter::NotBlacklisted,
                FilterArg::Failed => ViewFilter::Failed,
                FilterArg::All => ViewFilter::All,
            },
            format: match self.format {
                FormatArg::Table => ViewFormat::Table,
                FormatArg::Json => ViewFormat::RawJson,
            },
            show_images: self.images,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harvest_args() {
        let args = Args::try_parse_from([
            "listing-harvest",
            "harvest",
            "--query",
            "fahrrad",
            "--location",
            "80804",
            "--radius",
            "10",
            "--min-price",
            "100",
            "--max-price",
            "400",
            "-b",
            "renn,dame",
            "-b",
            "kind",
            "--store",
            "out/bikes.json",
        ])
        .unwrap();

        let Command::Harvest(harvest) = args.command else {
            panic!("expected harvest subcommand");
        };
        let query = harvest.query();
        assert_eq!(query.radius, "10");
        assert_eq!(query.min_price, Some(100));
        assert_eq!(query.page_count, 1);

        let config = harvest.apply(HarvestConfig::default());
        assert_eq!(
            config.blacklist.keywords(),
            ["renn".to_string(), "dame".to_string(), "kind".to_string()]
        );
        assert_eq!(config.store_path, PathBuf::from("out/bikes.json"));
        assert_eq!(config.save_every, 10);
        assert!(!config.retry_failed);
    }

    #[test]
    fn test_view_args_defaults() {
        let args = Args::try_parse_from(["listing-harvest", "view"]).unwrap();
        let Command::View(view) = args.command else {
            panic!("expected view subcommand");
        };
        assert_eq!(view.store, PathBuf::from("results.json"));
        assert_eq!(view.options(), ViewOptions::default());
    }

    #[test]
    fn test_view_args_json_all() {
        let args = Args::try_parse_from([
            "listing-harvest",
            "view",
            "--filter",
            "all",
            "--format",
            "json",
            "--images",
        ])
        .unwrap();
        let Command::View(view) = args.command else {
            panic!("expected view subcommand");
        };
        let options = view.options();
        assert_eq!(options.filter, ViewFilter::All);
        assert_eq!(options.format, ViewFormat::RawJson);
        assert!(options.show_images);
    }

    #[test]
    fn test_harvest_requires_query() {
        assert!(Args::try_parse_from(["listing-harvest", "harvest", "--location", "80804"]).is_err());
    }
}
