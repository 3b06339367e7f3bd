//! clitree-demo - a small tool showing off command trees and typed flags

use anyhow::{anyhow, bail, Context as _};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use chrono_tz::Tz;
use clitree::{App, BuildInfo, Command, Flag, IpMask, IpNet, Slot};
use std::net::IpAddr;
use tracing_subscriber::EnvFilter;

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CLITREE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    build_app().run_env();
}

fn build_app() -> App {
    let verbose = Slot::new(false);

    App::new("clitree-demo")
        .with_version(clitree::VERSION)
        .with_usage("exercise nested commands and typed flags")
        .with_authors("Wensheng Wang")
        .with_build_info(BuildInfo::parse(
            option_env!("CLITREE_BUILD_INFO").unwrap_or_default(),
        ))
        .with_env_file(".env")
        .with_flag(
            Flag::new("v, verbose")
                .with_usage("print the dispatched command")
                .bind(&verbose),
        )
        .with_command(echo_command(verbose.clone()))
        .with_command(net_command())
        .with_command(time_command())
        .with_command(
            Command::new("fail")
                .with_hidden(true)
                .with_action(|_| Err(anyhow!("requested failure"))),
        )
        .with_command(
            Command::new("panic")
                .with_hidden(true)
                .with_action(|_| panic!("requested panic")),
        )
        .with_command_not_found(|ctx, token| {
            ctx.show_error(format!("unknown command '{}'", token));
        })
}

fn echo_command(verbose: Slot<bool>) -> Command {
    let upper = Slot::new(false);
    let sep = Slot::new(String::new());

    Command::new("echo, say")
        .with_usage("print arguments")
        .with_examples("clitree-demo echo --sep=, a b c")
        .with_flag(
            Flag::new("u, upper")
                .with_usage("convert to upper case")
                .bind(&upper),
        )
        .with_flag(
            Flag::new("s, sep")
                .with_usage("separator between arguments")
                .with_placeholder("text")
                .with_default(" ")
                .with_env_var("CLITREE_SEP")
                .bind(&sep),
        )
        .with_action(move |ctx| {
            if verbose.get() {
                eprintln!("running {}", ctx.name());
            }
            let line = ctx.args().join(sep.borrow().as_str());
            if upper.get() {
                println!("{}", line.to_uppercase());
            } else {
                println!("{}", line);
            }
            Ok(())
        })
}

fn net_command() -> Command {
    let cidr = Slot::<Option<IpNet>>::default();

    let contains = Command::new("contains")
        .with_usage("check whether addresses fall inside a network")
        .with_usage_text("--cidr NETWORK ADDRESS...")
        .with_flag(
            Flag::new("c, cidr")
                .with_usage("network in CIDR notation")
                .with_placeholder("network")
                .bind(&cidr),
        )
        .with_action(move |ctx| {
            let net = cidr.get().context("--cidr is required")?;
            for arg in ctx.args() {
                let addr: IpAddr = arg
                    .parse()
                    .with_context(|| format!("invalid address '{}'", arg))?;
                println!("{}: {}", addr, if net.contains(&addr) { "yes" } else { "no" });
            }
            Ok(())
        });

    let mask = Command::new("mask")
        .with_usage("print the prefix length of dotted masks")
        .with_action(|ctx| {
            for arg in ctx.args() {
                let mask: IpMask = arg.parse()?;
                match mask.prefix_len() {
                    Some(len) => println!("{} /{}", mask, len),
                    None => bail!("mask '{}' is not canonical", arg),
                }
            }
            Ok(())
        });

    Command::new("net")
        .with_usage("network helpers")
        .with_command(contains)
        .with_command(mask)
}

fn time_command() -> Command {
    let at = Slot::<Option<DateTime<FixedOffset>>>::default();
    let after = Slot::new(Duration::zero());
    let tz = Slot::new(Tz::UTC);

    Command::new("time")
        .with_usage("show a timestamp in another zone")
        .with_flag(
            Flag::new("at")
                .with_usage("timestamp to convert, now when omitted")
                .with_placeholder("time")
                .bind(&at),
        )
        .with_flag(
            Flag::new("after")
                .with_usage("offset added to the timestamp")
                .with_placeholder("duration")
                .bind(&after),
        )
        .with_flag(
            Flag::new("tz")
                .with_usage("target time zone")
                .with_placeholder("zone")
                .with_default("UTC")
                .with_env_var("CLITREE_TZ")
                .bind(&tz),
        )
        .with_action(move |_| {
            let base = at.get().unwrap_or_else(|| Utc::now().fixed_offset());
            let when = base + after.get();
            println!("{}", when.with_timezone(&tz.get()).format("%Y-%m-%d %H:%M:%S %Z"));
            Ok(())
        })
}
