use std::ffi::OsString;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::headers::RequestHeaders;

/// The only host the probe is allowed to talk to.
pub const TRUSTED_HOST: &str = "127.0.0.1";

/// Target used when no URL argument is given.
pub const DEFAULT_URL: &str = "http://127.0.0.1:8000/ping";

const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

#[derive(Parser, Debug)]
#[command(
    author,
    about,
    long_about = None,
    disable_version_flag = true,
    override_usage = "loopback_probe [OPTIONS] [URL]"
)]
struct Args {
    /// Print version and exit
    #[arg(short = 'V', long)]
    version: bool,

    /// Timeout for the whole request, e.g. `500ms`, `5s`, `1m30s` (0 disables it)
    #[arg(short, long, value_name = "DURATION", default_value = "0")]
    timeout: String,

    /// Request header, may be repeated
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
    headers: Vec<String>,

    /// Do not print the failure cause (still exits with a failure status)
    #[arg(
        short = 'f',
        long,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        require_equals = true,
        default_value = "true",
        default_missing_value = "true"
    )]
    fail_silently: bool,

    /// Skip TLS certificate verification
    #[arg(
        short = 's',
        long = "insecure",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        require_equals = true,
        default_value = "true",
        default_missing_value = "true"
    )]
    skip_tls_verify: bool,

    /// Target URL [default: http://127.0.0.1:8000/ping]
    #[arg(value_name = "URL")]
    url: Option<String>,
}

/// What the command line asked for.
#[derive(Debug)]
pub enum Invocation {
    /// `-V` was given; nothing else is validated.
    Version,
    Probe(ProbeConfig),
}

/// Validated probe settings, immutable after [`resolve`].
#[derive(Clone, Debug)]
pub struct ProbeConfig {
    target: Url,
    timeout: Duration,
    headers: RequestHeaders,
    fail_silently: bool,
    skip_tls_verify: bool,
}

impl ProbeConfig {
    pub fn target(&self) -> &Url {
        &self.target
    }

    /// The request timeout, `None` when unbounded.
    pub fn timeout(&self) -> Option<Duration> {
        (!self.timeout.is_zero()).then_some(self.timeout)
    }

    pub fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    pub fn fail_silently(&self) -> bool {
        self.fail_silently
    }

    pub fn skip_tls_verify(&self) -> bool {
        self.skip_tls_verify
    }
}

/// Resolves raw command line arguments, program name first.
#[tracing::instrument(level = "debug", skip(args))]
pub fn resolve<I, T>(args: I) -> ConfigResult<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = Args::try_parse_from(args)?;
    if args.version {
        return Ok(Invocation::Version);
    }

    let timeout = parse_timeout(&args.timeout)?;
    let headers = RequestHeaders::try_from(args.headers.as_slice())?;
    let target = parse_target(args.url.as_deref())?;

    Ok(Invocation::Probe(ProbeConfig {
        target,
        timeout,
        headers,
        fail_silently: args.fail_silently,
        skip_tls_verify: args.skip_tls_verify,
    }))
}

/// Short usage line for diagnostics that are not produced by clap itself.
pub fn usage() -> String {
    use clap::CommandFactory;

    Args::command().render_usage().to_string()
}

fn parse_timeout(input: &str) -> ConfigResult<Duration> {
    let trimmed = input.trim();
    if trimmed == "0" {
        return Ok(Duration::ZERO);
    }
    humantime::parse_duration(trimmed).map_err(|source| ConfigError::InvalidTimeout {
        input: input.to_string(),
        source,
    })
}

fn parse_target(candidate: Option<&str>) -> ConfigResult<Url> {
    let candidate = match candidate {
        Some(url) if !url.is_empty() => url,
        _ => DEFAULT_URL,
    };

    let url = Url::parse(candidate).map_err(|source| ConfigError::InvalidUrl {
        input: candidate.to_string(),
        source,
    })?;

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(ConfigError::InvalidScheme(url.scheme().to_string()));
    }

    // Port is deliberately not part of the comparison.
    let host = url.host_str().unwrap_or_default();
    if host != TRUSTED_HOST {
        return Err(ConfigError::InvalidHost(host.to_string()));
    }

    Ok(url)
}
