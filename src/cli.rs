use clap::Parser;
use std::path::PathBuf;
use tubetap::config::Config;

#[derive(Parser, Debug)]
#[command(name = "tubetap")]
#[command(version)]
#[command(about = "Watch beanstalkd tubes and log every job that flows through", long_about = None)]
pub struct Cli {
    /// Broker host
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Broker port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Seconds to sleep between reservation attempts (0 busy-polls)
    #[arg(short = 'd', long)]
    pub delay: Option<f64>,

    /// Comma-separated list of tubes to watch
    #[arg(short = 't', long, value_delimiter = ',')]
    pub tubes: Option<Vec<String>>,

    /// Log filter directive (e.g. "info", "tubetap=debug")
    #[arg(short = 'l', long)]
    pub log_level: Option<String>,

    /// Log destination: "-" for the console, otherwise a file path
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// Path to a TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Fold flag overrides into the layered configuration. Flags beat every
    /// file and environment source; absent flags leave values untouched.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(host) = &self.host {
            config.broker.host = host.clone();
        }
        if let Some(port) = self.port {
            config.broker.port = port;
        }
        if let Some(delay) = self.delay {
            config.watch.delay_secs = delay;
        }
        if let Some(tubes) = &self.tubes {
            config.watch.tubes = tubes.clone();
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
        if let Some(output) = &self.output {
            config.log.output = output.clone();
        }
        config
    }
}
