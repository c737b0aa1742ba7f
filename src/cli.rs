use clap::Parser;
use std::net::SocketAddr;

use crate::serve::DEFAULT_DOCUMENT;

#[derive(Parser, Debug)]
#[command(name = "zipstatic")]
#[command(version)]
#[command(about = "Serve static assets straight out of a ZIP archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipstatic site.zip                          serve site.zip on 127.0.0.1:8080\n  \
  zipstatic -l 0.0.0.0:80 -m /static site.zip serve under /static on port 80\n  \
  zipstatic https://example.com/site.zip      serve a remote archive via Range requests")]
pub struct Cli {
    /// ZIP archive path or HTTP URL
    #[arg(value_name = "ARCHIVE")]
    pub archive: String,

    /// Address to listen on
    #[arg(short = 'l', long, value_name = "ADDR", default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// URL prefix the archive is served under
    #[arg(short = 'm', long, value_name = "PREFIX", default_value = "/")]
    pub mount: String,

    /// Document served for an empty path
    #[arg(long, value_name = "NAME", default_value = DEFAULT_DOCUMENT)]
    pub default_document: String,

    /// Seconds to wait for open connections on shutdown
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub shutdown_timeout: u64,

    /// Verbose logging (-vv => trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (-qq => errors only)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        crate::zip::is_http_url(&self.archive)
    }

    /// Log filter used when `RUST_LOG` is not set
    pub fn log_filter(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (q, _) if q > 1 => "error",
            (1, _) => "warn",
            (_, 0) => "info",
            (_, 1) => "debug",
            _ => "trace",
        }
    }
}
