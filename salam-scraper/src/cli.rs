use std::env;
use std::path::PathBuf;
use std::process;

use chrono_tz::Tz;
use getopts::Options;
use tokio::time::Duration;

pub const DEFAULT_FEED_URL: &str = "https://salamcenter.org/events/feed/";
pub const DEFAULT_OUTPUT: &str = "salam_events.ics";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Clone)]
pub struct Config {
    pub feed_url: String,
    pub output: PathBuf,
    pub timezone: Tz,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.into(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            timezone: chrono_tz::America::Los_Angeles,
            timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.into(),
        }
    }
}

pub struct Args {
    pub config: Config,
    pub json: bool,
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "u",
        "url",
        &format!("Events feed to scrape [Default: {DEFAULT_FEED_URL}]"),
        "URL",
    );
    opts.optopt(
        "o",
        "output",
        &format!("Calendar file to merge into [Default: {DEFAULT_OUTPUT}]"),
        "PATH",
    );
    opts.optopt(
        "z",
        "timezone",
        "Timezone for feed dates without an offset [Default: America/Los_Angeles]",
        "TZ",
    );
    opts.optopt(
        "t",
        "timeout",
        "Timeout for the feed request [Default: 10]",
        "SECONDS",
    );
    opts.optflag(
        "j",
        "json",
        "Print the newly added events as JSON on stdout",
    );
    opts
}

pub fn parse(args: Vec<String>) -> Args {
    let opts = opts();

    let matches = match opts.parse(args) {
        Ok(matches) => matches,
        Err(fail) => {
            eprintln!("{fail}");
            process::exit(1);
        }
    };

    if matches.opt_present("help") {
        println!("{}", opts.usage(&opts.short_usage(env!("CARGO_PKG_NAME"))));
        process::exit(0);
    }

    let mut config = Config::default();

    if let Some(url) = matches.opt_str("url") {
        config.feed_url = url;
    }

    if let Some(output) = matches.opt_str("output") {
        config.output = PathBuf::from(output);
    }

    if let Some(name) = matches.opt_str("timezone") {
        config.timezone = match name.parse::<Tz>() {
            Ok(tz) => tz,
            Err(err) => {
                eprintln!("Provided value for option 'timezone' is invalid: {err}");
                process::exit(1);
            }
        };
    }

    config.timeout = match matches.opt_get_default("timeout", 10) {
        Ok(secs) => Duration::from_secs(secs),
        Err(err) => {
            eprintln!("Provided value for option 'timeout' is invalid: {err}");
            process::exit(1);
        }
    };

    Args {
        config,
        json: matches.opt_present("json"),
    }
}
