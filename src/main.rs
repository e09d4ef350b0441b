use std::path::PathBuf;
use std::process::exit;

use clap::{arg, command, value_parser, Command};

use bubble_sheet::answer_key::load_answer_key;
use bubble_sheet::config::Options;
use bubble_sheet::interpret::evaluate_batch;

fn main() {
    pretty_env_logger::init_custom_env("LOG");

    let matches = cli().get_matches();
    let debug = matches.get_flag("debug");
    let rows = *matches.get_one::<usize>("rows").expect("rows has a default");
    let cols = *matches.get_one::<usize>("cols").expect("cols has a default");
    let key_path = matches
        .get_one::<PathBuf>("key")
        .expect("answer key path is required");
    let image_paths = matches
        .get_many::<PathBuf>("images")
        .expect("at least one image is required")
        .cloned()
        .collect::<Vec<PathBuf>>();

    let mut options = match matches.get_one::<PathBuf>("config") {
        Some(config_path) => match Options::from_json_file(config_path) {
            Ok(options) => options,
            Err(e) => {
                eprintln!("Error loading options: {}", e);
                exit(1);
            }
        },
        None => Options::default(),
    };
    if let Some(fill_threshold) = matches.get_one::<f64>("fill_threshold") {
        options.fill_threshold = *fill_threshold;
    }
    if let Err(e) = options.validate() {
        eprintln!("Error loading options: {}", e);
        exit(1);
    }

    let key = match load_answer_key(key_path, rows, cols, options.key_delimiter) {
        Ok(key) => key,
        Err(e) => {
            eprintln!("Error loading answer key: {}", e);
            exit(1);
        }
    };

    let mut failed = false;
    for (path, result) in evaluate_batch(&image_paths, rows, cols, &key, &options, debug) {
        match result.map(|result| serde_json::to_string(&result)) {
            Ok(Ok(json)) => println!("{}", json),
            Ok(Err(e)) => {
                eprintln!("{}: unable to serialize result: {}", path.display(), e);
                failed = true;
            }
            Err(e) => {
                eprintln!("{}: {} error: {}", path.display(), e.stage(), e);
                failed = true;
            }
        }
    }

    if failed {
        exit(1);
    }
}

#[allow(clippy::cognitive_complexity)]
fn cli() -> Command {
    command!()
        .arg(
            arg!(-k --key <PATH> "Path to the answer key CSV file")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(-r --rows <ROWS> "Number of bubble rows on the sheet")
                .default_value("5")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(-c --cols <COLS> "Number of bubble columns on the sheet")
                .default_value("20")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(--config <PATH> "Path to a JSON options file")
                .required(false)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(--fill_threshold <INTENSITY> "Mean intensity below which a bubble reads as filled")
                .long("fill-threshold")
                .required(false)
                .value_parser(value_parser!(f64)),
        )
        .arg(arg!(-d --debug "Write debug images next to each input image"))
        .arg(
            arg!(images: <IMAGE> ... "Paths to answer sheet images")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let matches = cli()
            .try_get_matches_from(["bubble-sheet", "--key", "key.csv", "a.png", "b.png"])
            .unwrap();
        assert_eq!(matches.get_one::<usize>("rows"), Some(&5));
        assert_eq!(matches.get_one::<usize>("cols"), Some(&20));
        assert_eq!(matches.get_many::<PathBuf>("images").unwrap().count(), 2);
        assert!(!matches.get_flag("debug"));
    }

    #[test]
    fn test_cli_fill_threshold() {
        let matches = cli()
            .try_get_matches_from([
                "bubble-sheet",
                "-k",
                "key.csv",
                "--fill-threshold",
                "110.5",
                "a.png",
            ])
            .unwrap();
        assert_eq!(matches.get_one::<f64>("fill_threshold"), Some(&110.5));
    }
}
