//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `edutrack_core` linkage.
//! - Optionally materialize, increment, and print one user's counters for today.
//!
//! Usage: `edutrack_cli [stats <user_id> | record <user_id> <counter> <amount>]`

use edutrack_core::db::open_db;
use edutrack_core::{
    init_logging, Clock, CounterKind, CoreConfig, CountersService, DailyCounters,
    SqliteCountersRepository, StatsSnapshot, SystemClock, UserId,
};
use std::process::ExitCode;

const USAGE: &str = "usage: edutrack_cli [stats <user_id> | record <user_id> <counter> <amount>]";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Smoke,
    Stats {
        user_id: String,
    },
    Record {
        user_id: String,
        kind: CounterKind,
        amount: u32,
    },
}

fn main() -> ExitCode {
    println!("edutrack_core ping={}", edutrack_core::ping());
    println!("edutrack_core version={}", edutrack_core::core_version());
    println!("edutrack_core today={}", SystemClock.today());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_command(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("command failed: {message}");
            ExitCode::FAILURE
        }
    }
}

fn parse_command(args: &[String]) -> Result<Command, String> {
    match args {
        [] => Ok(Command::Smoke),
        [command, user_id] if command == "stats" => Ok(Command::Stats {
            user_id: user_id.clone(),
        }),
        [command, user_id, counter, amount] if command == "record" => {
            let kind = CounterKind::parse(counter).ok_or_else(|| {
                let known: Vec<&str> = CounterKind::ALL.iter().map(|kind| kind.name()).collect();
                format!("unknown counter `{counter}`; expected one of {}", known.join("|"))
            })?;
            let amount = amount
                .parse::<u32>()
                .map_err(|err| format!("invalid amount `{amount}`: {err}"))?;
            Ok(Command::Record {
                user_id: user_id.clone(),
                kind,
                amount,
            })
        }
        _ => Err("unrecognized arguments".to_string()),
    }
}

fn run(command: Command) -> Result<(), String> {
    let (raw_user_id, record) = match command {
        Command::Smoke => return Ok(()),
        Command::Stats { user_id } => (user_id, None),
        Command::Record {
            user_id,
            kind,
            amount,
        } => (user_id, Some((kind, amount))),
    };

    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(settings) = &config.log {
        init_logging(settings).map_err(|err| err.to_string())?;
    }

    let user_id = UserId::parse(&raw_user_id).map_err(|err| err.to_string())?;
    let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let repo = SqliteCountersRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let service = CountersService::new(repo, SystemClock);

    let stats = match record {
        Some((kind, amount)) => service
            .record_activity(&user_id, kind, amount)
            .map(StatsSnapshot::from),
        None => service.get_my_stats(&user_id),
    }
    .map_err(|err| err.to_string())?;

    print_stats(&stats);
    Ok(())
}

fn print_stats(stats: &StatsSnapshot) {
    println!("day={} label=\"{}\"", stats.day(), stats.date_label);
    print_counters(&stats.counters);
}

fn print_counters(counters: &DailyCounters) {
    if counters.is_untouched() {
        println!("no activity yet");
    }
    for kind in CounterKind::ALL {
        println!("{}={}", kind.name(), counters.get(kind));
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_command, Command};
    use edutrack_core::CounterKind;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn no_arguments_runs_smoke_only() {
        assert_eq!(parse_command(&[]), Ok(Command::Smoke));
    }

    #[test]
    fn parses_stats_command() {
        assert_eq!(
            parse_command(&args(&["stats", "u1"])),
            Ok(Command::Stats {
                user_id: "u1".to_string()
            })
        );
    }

    #[test]
    fn parses_record_command_by_name_or_column() {
        let expected = Command::Record {
            user_id: "u1".to_string(),
            kind: CounterKind::LessonsCompleted,
            amount: 2,
        };
        assert_eq!(
            parse_command(&args(&["record", "u1", "lessonsCompleted", "2"])),
            Ok(expected.clone())
        );
        assert_eq!(
            parse_command(&args(&["record", "u1", "lessons_completed", "2"])),
            Ok(expected)
        );
    }

    #[test]
    fn rejects_unknown_counter_and_bad_amount() {
        let err = parse_command(&args(&["record", "u1", "streak", "1"])).unwrap_err();
        assert!(err.contains("unknown counter `streak`"), "{err}");
        assert!(err.contains("xpEarned"), "{err}");

        let err = parse_command(&args(&["record", "u1", "xpEarned", "-3"])).unwrap_err();
        assert!(err.contains("invalid amount"), "{err}");

        assert!(parse_command(&args(&["stats"])).is_err());
    }
}
