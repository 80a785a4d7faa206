#![deny(clippy::unwrap_used)]

use chrono::Local;
use clap::{arg, command, value_parser};
use std::path::PathBuf;
use std::process::exit;
use std::time::{Duration, Instant};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use vc8145::schedule::{is_valid_format, Schedule, Stamp, DEFAULT_CYCLE};
use vc8145::{Device, RenderOptions};

#[derive(Debug)]
struct Options {
    verbose: bool,
    seconds: bool,
    time: bool,
    date: Option<String>,
    render: RenderOptions,
    cycle: Duration,
    number: u32,
    device: PathBuf,
}

impl From<&clap::ArgMatches> for Options {
    fn from(matches: &clap::ArgMatches) -> Self {
        Self {
            verbose: matches.get_flag("verbose"),
            seconds: matches.get_flag("seconds"),
            time: matches.get_flag("time"),
            date: matches.get_one::<String>("date").cloned(),
            render: RenderOptions {
                show_mode: matches.get_flag("mode"),
                show_unit: matches.get_flag("unit"),
            },
            cycle: matches
                .get_one::<Duration>("cycle")
                .copied()
                .unwrap_or(DEFAULT_CYCLE),
            number: matches.get_one::<u32>("number").copied().unwrap_or(0),
            device: matches
                .get_one::<PathBuf>("device")
                .cloned()
                .unwrap_or_default(),
        }
    }
}

impl Options {
    fn print(&self) {
        println!("Options:");
        println!("verbose:  {}", self.verbose);
        println!("seconds:  {}", self.seconds);
        println!("time:     {}", self.time);
        println!("date:     {}", self.date.as_deref().unwrap_or(""));
        println!("mode:     {}", self.render.show_mode);
        println!("unit:     {}", self.render.show_unit);
        println!("cycle:    {:.6}", self.cycle.as_secs_f64());
        println!("number:   {}", self.number);
        println!("device:   {}", self.device.display());
        println!();
    }
}

fn parse_cycle(s: &str) -> Result<Duration, String> {
    let secs = s
        .parse::<f64>()
        .map_err(|_| format!("invalid floating point value \"{}\"", s))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!(
            "cycle time must be a non-negative number of seconds, got \"{}\"",
            s
        ));
    }
    Ok(Duration::from_secs_f64(secs))
}

fn parse_date_format(s: &str) -> Result<String, String> {
    if is_valid_format(s) {
        Ok(s.to_string())
    } else {
        Err(format!("invalid date format \"{}\"", s))
    }
}

fn cli() -> clap::Command {
    command!() // requires `cargo` feature
        .arg(
            arg!(
                <device> "Serial communication device, used for communication with multimeter"
            )
            .value_parser(value_parser!(PathBuf)),
        )
        .arg(arg!(
            -v --verbose "Show verbose information"
        ))
        .arg(arg!(
            -s --seconds "Show how many seconds have passed since the start"
        ))
        .arg(arg!(
            -t --time "Show measure time"
        ))
        .arg(
            arg!(
                -d --date <FORMAT> "strftime format for the date part of measure time, e.g. \"%d.%m.%Y\""
            )
            .required(false)
            .value_parser(parse_date_format),
        )
        .arg(arg!(
            -m --mode "Show multimeter mode"
        ))
        .arg(arg!(
            -u --unit "Show measure units"
        ))
        .arg(
            arg!(
                -c --cycle <SECONDS> "Measure cycle time in seconds, integer or real"
            )
            .required(false)
            .default_value("1")
            .value_parser(parse_cycle),
        )
        .arg(
            arg!(
                -n --number <COUNT> "Limit to number of measure cycles (0 - no limit)"
            )
            .required(false)
            .default_value("0")
            .value_parser(value_parser!(u32)),
        )
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let options = Options::from(&cli().get_matches());
    if options.verbose {
        options.print();
    }

    let mut device = match Device::open(options.device.to_string_lossy()) {
        Ok(device) => device,
        Err(err) => {
            eprintln!("Communication device initialization error: {}", err);
            exit(1);
        }
    };

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        }
    });

    run(&mut device, &options, &shutdown).await;
    device.close();
}

async fn run(device: &mut Device, options: &Options, shutdown: &CancellationToken) {
    let mut schedule = Schedule::new(options.cycle, options.number);
    let mut stamp = Stamp::new(options.seconds, options.time, options.date.as_deref());

    loop {
        tokio::select! {
            _ = schedule.next_cycle() => {}
            _ = shutdown.cancelled() => break,
        }

        let prefix = stamp.prefix(Instant::now(), &Local::now());
        match device.poll(options.render).await {
            Ok(rendered) => {
                println!("{}{}", prefix, rendered);
                for diagnostic in &rendered.diagnostics {
                    eprintln!("Read VC8145 data error: {}", diagnostic);
                }
            }
            Err(err) => {
                // An empty line keeps the output aligned with the cycles.
                println!("{}", prefix);
                if !shutdown.is_cancelled() {
                    eprintln!("Read VC8145 data error: {}", err);
                }
            }
        }

        if shutdown.is_cancelled() || !schedule.finish_cycle() {
            break;
        }
    }
}
