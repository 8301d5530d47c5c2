//! CLI integration tests.
//!
//! Tests cover:
//! - Argument parsing for every subcommand
//! - Store selection from INI config (memory, csv, sqlite, invalid)
//! - Seeding a file-backed store and reopening it
//! - Command execution and rendered output against a fixed clock

mod common;

use clap::Parser;
use common::*;
use rust_decimal_macros::dec;
use simplestocks::adapters::clock::FixedClock;
use simplestocks::adapters::file_config_adapter::FileConfigAdapter;
use simplestocks::adapters::memory_adapter::InMemoryDataStore;
use simplestocks::cli::{self, Cli, Command, EngineCommand, Side};
use simplestocks::domain::engine::StockEngine;
use simplestocks::domain::error::StocksError;
use simplestocks::ports::data_port::DataPort;
use std::io::Write;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn memory_engine() -> StockEngine<InMemoryDataStore, FixedClock> {
    StockEngine::new(
        InMemoryDataStore::new(sample_stocks()),
        FixedClock::new(now()),
    )
}

mod parsing {
    use super::*;

    #[test]
    fn parses_record_trade() {
        let cli = Cli::try_parse_from([
            "simplestocks",
            "record-trade",
            "--symbol",
            "JOE",
            "--quantity",
            "3000",
            "--side",
            "sell",
            "--price",
            "18.53",
            "--at",
            "2024-06-03T14:25:00Z",
        ])
        .unwrap();

        match cli.command {
            Command::Engine(EngineCommand::RecordTrade {
                symbol,
                quantity,
                side,
                price,
                at,
            }) => {
                assert_eq!(symbol, "JOE");
                assert_eq!(quantity, 3000);
                assert_eq!(side, Side::Sell);
                assert_eq!(price, dec!(18.53));
                assert_eq!(at, Some(now() - minutes(5)));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["simplestocks", "index", "--config", "stocks.ini"]).unwrap();
        assert_eq!(cli.config.unwrap().to_str(), Some("stocks.ini"));
        assert!(matches!(
            cli.command,
            Command::Engine(EngineCommand::Index)
        ));
    }

    #[test]
    fn seed_is_not_an_engine_command() {
        let cli = Cli::try_parse_from(["simplestocks", "seed"]).unwrap();
        assert!(matches!(cli.command, Command::Seed));
    }

    #[test]
    fn rejects_invalid_price() {
        let result = Cli::try_parse_from([
            "simplestocks",
            "dividend-yield",
            "--symbol",
            "ALE",
            "--price",
            "two",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn record_trade_requires_side() {
        let result = Cli::try_parse_from([
            "simplestocks",
            "record-trade",
            "--symbol",
            "JOE",
            "--quantity",
            "1",
            "--price",
            "1",
        ]);
        assert!(result.is_err());
    }
}

mod store_selection {
    use super::*;

    #[test]
    fn defaults_to_memory_with_sample_catalog() {
        let store = cli::build_store(&FileConfigAdapter::empty()).unwrap();
        assert_eq!(store.list_stocks().unwrap(), sample_stocks());
        assert!(store.list_trades().unwrap().is_empty());
    }

    #[test]
    fn unknown_backend_is_config_error() {
        let config = FileConfigAdapter::from_string("[store]\nbackend = oracle\n").unwrap();
        let err = cli::build_store(&config).err().unwrap();
        assert!(matches!(err, StocksError::ConfigInvalid { ref key, .. } if key == "backend"));
    }

    #[test]
    fn csv_backend_requires_path() {
        let config = FileConfigAdapter::from_string("[store]\nbackend = csv\n").unwrap();
        let err = cli::build_store(&config).err().unwrap();
        assert!(matches!(err, StocksError::ConfigMissing { ref section, .. } if section == "csv"));
    }

    #[test]
    fn seeded_csv_store_round_trips_trades() {
        let dir = tempfile::TempDir::new().unwrap();
        let ini = format!("[store]\nbackend = csv\n\n[csv]\npath = {}\n", dir.path().display());
        let file = write_temp_ini(&ini);
        let config = cli::load_config(&file.path().to_path_buf()).unwrap();

        assert_eq!(cli::seed_store(&config).unwrap(), 5);

        let store = cli::build_store(&config).unwrap();
        let mut engine = StockEngine::new(store, FixedClock::new(now()));
        engine
            .record_trade("GIN", 10, true, dec!(12), now() - minutes(1))
            .unwrap();

        let reopened = cli::build_store(&config).unwrap();
        let engine = StockEngine::new(reopened, FixedClock::new(now()));
        assert_eq!(engine.volume_weighted_price("GIN").unwrap(), dec!(12));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn seeded_sqlite_store_round_trips_trades() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = dir.path().join("stocks.db");
        let ini = format!(
            "[store]\nbackend = sqlite\n\n[sqlite]\npath = {}\npool_size = 1\n",
            db.display()
        );
        let config = FileConfigAdapter::from_string(&ini).unwrap();

        cli::seed_store(&config).unwrap();
        {
            let store = cli::build_store(&config).unwrap();
            let mut engine = StockEngine::new(store, FixedClock::new(now()));
            engine
                .record_trade("ALE", 4, false, dec!(130), now() - minutes(2))
                .unwrap();
        }

        let store = cli::build_store(&config).unwrap();
        let engine = StockEngine::new(store, FixedClock::new(now()));
        assert_eq!(engine.all_share_index().unwrap(), dec!(130));
    }

    #[test]
    fn memory_seed_writes_nothing() {
        assert_eq!(cli::seed_store(&FileConfigAdapter::empty()).unwrap(), 5);
    }

    #[test]
    fn missing_config_file_maps_to_config_exit_code() {
        let code = cli::load_config(&"/nonexistent/simplestocks.ini".into()).err().unwrap();
        assert_eq!(
            format!("{code:?}"),
            format!("{:?}", std::process::ExitCode::from(2))
        );
    }
}

mod execution {
    use super::*;

    #[test]
    fn stocks_lists_catalog() {
        let mut engine = memory_engine();
        let output = cli::execute(&EngineCommand::Stocks, &mut engine).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[3].starts_with("GIN"));
        assert!(lines[3].contains("Preferred"));
        assert!(lines[3].contains("fixed_dividend=2%"));
        assert!(lines[0].contains("fixed_dividend=-"));
    }

    #[test]
    fn dividend_yield_and_pe_ratio() {
        let mut engine = memory_engine();
        let dy = EngineCommand::DividendYield {
            symbol: "ALE".into(),
            price: dec!(2),
        };
        assert_eq!(cli::execute(&dy, &mut engine).unwrap(), "11.5");

        let pe = EngineCommand::PeRatio {
            symbol: "ALE".into(),
            price: dec!(46),
        };
        assert_eq!(cli::execute(&pe, &mut engine).unwrap(), "2");
    }

    #[test]
    fn unknown_symbol_is_not_found() {
        let mut engine = memory_engine();
        let cmd = EngineCommand::PeRatio {
            symbol: "XYZ".into(),
            price: dec!(1),
        };
        assert!(matches!(
            cli::execute(&cmd, &mut engine),
            Err(StocksError::NotFound { .. })
        ));
    }

    #[test]
    fn record_trade_defaults_to_clock_now() {
        let mut engine = memory_engine();
        let cmd = EngineCommand::RecordTrade {
            symbol: "POP".into(),
            quantity: 20,
            side: Side::Buy,
            price: dec!(9.5),
            at: None,
        };
        let output = cli::execute(&cmd, &mut engine).unwrap();
        assert!(output.starts_with("recorded buy 20 POP @ 9.5"));

        let trades = engine.data().list_trades().unwrap();
        assert_eq!(trades[0].timestamp, now());
        assert_eq!(engine.data().commit_count(), 1);

        let vwap = EngineCommand::Vwap {
            symbol: "POP".into(),
        };
        assert_eq!(cli::execute(&vwap, &mut engine).unwrap(), "9.5");
        assert_eq!(cli::execute(&EngineCommand::Index, &mut engine).unwrap(), "9.5");
    }

    #[test]
    fn record_trade_renders_sell_side() {
        let mut engine = memory_engine();
        let cmd = EngineCommand::RecordTrade {
            symbol: "JOE".into(),
            quantity: 3000,
            side: Side::Sell,
            price: dec!(18.53),
            at: Some(now() - minutes(5)),
        };
        let output = cli::execute(&cmd, &mut engine).unwrap();
        assert_eq!(
            output,
            format!("recorded sell 3000 JOE @ 18.53 at {}", (now() - minutes(5)).to_rfc3339())
        );

        let trades = engine.data().list_trades().unwrap();
        assert!(!trades[0].buy);
    }

    #[test]
    fn index_without_trades_is_no_data() {
        let mut engine = memory_engine();
        assert!(matches!(
            cli::execute(&EngineCommand::Index, &mut engine),
            Err(StocksError::NoData { .. })
        ));
    }
}
