use anyhow::{anyhow, bail, Context, Result};

pub const DEFAULT_CONFIG_PATH: &str = "conf.d/vmware.yaml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub config_path: String,
    pub replay_path: String,
    /// Overrides `init_config.collection_interval_secs`.
    pub interval_secs: Option<u64>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CliAction {
    Run(RunOptions),
    Help,
}

pub fn usage() -> &'static str {
    "Usage:\n  vsmon-agent --replay <fixture.json> [options]\n\nOptions:\n  --config <path>         check configuration (default: conf.d/vmware.yaml)\n  --replay <path>         recorded inventory and statistics to serve\n  --interval-secs <n>     repeat every n seconds until Ctrl-C (default: run once)\n  -h, --help              show this help"
}

pub fn parse_args<I>(args: I) -> Result<CliAction>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut config_path = DEFAULT_CONFIG_PATH.to_string();
    let mut replay_path = None;
    let mut interval_secs = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliAction::Help),
            "--config" => config_path = next_value(&mut args, "--config")?,
            "--replay" => replay_path = Some(next_value(&mut args, "--replay")?),
            "--interval-secs" => {
                let value = next_value(&mut args, "--interval-secs")?;
                interval_secs = Some(parse_positive_u64(&value, "--interval-secs")?);
            }
            _ => bail!("unknown argument: {arg}"),
        }
    }

    let replay_path = replay_path.ok_or_else(|| anyhow!("--replay is required"))?;
    Ok(CliAction::Run(RunOptions {
        config_path,
        replay_path,
        interval_secs,
    }))
}

fn next_value<I>(args: &mut I, flag: &str) -> Result<String>
where
    I: Iterator<Item = String>,
{
    args.next()
        .ok_or_else(|| anyhow!("missing value for {flag}"))
}

fn parse_positive_u64(value: &str, flag: &str) -> Result<u64> {
    let parsed = value
        .parse::<u64>()
        .with_context(|| format!("invalid number for {flag}: {value}"))?;
    if parsed == 0 {
        bail!("{flag} must be greater than 0");
    }
    Ok(parsed)
}
