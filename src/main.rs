use anyhow::{Context, Result};
use clap::{App, AppSettings, Arg, ArgMatches};
use log::{error, info};
use rustaf::{
    received_signal, register_signal_handlers, schedule_alarm, ArgumentNameIndex,
    ExtensionEnumerator, Heuristics, InterruptedError, ProofWriter, Semantics, SetafInstance,
    SignalKind, SimpleFormatReader, StableEnumerationSolver,
};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

/// The exit code returned when the program arguments are invalid.
const EXIT_CODE_ARGUMENTS: i32 = 1;
/// The exit code returned when the program is interrupted by a signal other than the alarm.
const EXIT_CODE_SIGNAL: i32 = 2;
/// The exit code returned when a problem occurs while parsing the input files.
const EXIT_CODE_PARSING: i32 = 4;
/// The exit code returned when the program is interrupted by the timeout.
const EXIT_CODE_TIMEOUT: i32 = 9;
/// The exit code returned when something unexpected goes wrong.
const EXIT_CODE_UNEXPECTED: i32 = 20;

const ARG_INSTANCE: &str = "INSTANCE";
const ARG_DESCRIPTION: &str = "DESCRIPTION";
const ARG_REQUIRED_ARGUMENTS: &str = "REQUIRED_ARGUMENTS";
const ARG_SEMANTICS: &str = "SEMANTICS";
const ARG_NUMBER_OF_MODELS: &str = "NUMBER_OF_MODELS";
const ARG_TIMEOUT: &str = "TIMEOUT";
const ARG_FORGET_PERCENTAGE: &str = "FORGET_PERCENTAGE";
const ARG_GROWTH_RATE: &str = "GROWTH_RATE";
const ARG_QUIET: &str = "QUIET";
const ARG_HEURISTICS: &str = "HEURISTICS";
const ARG_PROOF_OUTPUT: &str = "PROOF_OUTPUT";
const ARG_LOGGING_LEVEL: &str = "LOGGING_LEVEL";

fn create_app<'a>() -> App<'a, 'a> {
    App::new(option_env!("CARGO_PKG_NAME").unwrap_or("rustaf"))
        .version(option_env!("CARGO_PKG_VERSION").unwrap_or("unknown version"))
        .author(option_env!("CARGO_PKG_AUTHORS").unwrap_or("unknown authors"))
        .about("Rustaf, a stable-extension enumerator for SETAFs.")
        .setting(AppSettings::DisableVersion)
        .help_short("H")
        .arg(
            Arg::with_name(ARG_INSTANCE)
                .short("i")
                .empty_values(false)
                .help("the input file that contains the SETAF instance")
                .required(true),
        )
        .arg(
            Arg::with_name(ARG_DESCRIPTION)
                .short("d")
                .empty_values(false)
                .help("a file mapping argument ids to display names")
                .required(false),
        )
        .arg(
            Arg::with_name(ARG_REQUIRED_ARGUMENTS)
                .short("r")
                .empty_values(false)
                .help("a file of arguments required to be accepted or rejected")
                .required(false),
        )
        .arg(
            Arg::with_name(ARG_SEMANTICS)
                .short("s")
                .empty_values(false)
                .possible_values(&["Stable"])
                .default_value("Stable")
                .help("the semantics under which the extensions are computed")
                .required(false),
        )
        .arg(
            Arg::with_name(ARG_NUMBER_OF_MODELS)
                .short("n")
                .empty_values(false)
                .default_value("0")
                .help("the number of models to enumerate (0 stands for all of them)")
                .required(false),
        )
        .arg(
            Arg::with_name(ARG_TIMEOUT)
                .short("t")
                .empty_values(false)
                .help("a timeout in seconds")
                .required(false),
        )
        .arg(
            Arg::with_name(ARG_FORGET_PERCENTAGE)
                .short("p")
                .empty_values(false)
                .default_value("0.5")
                .help("the fraction of the learned clauses forgotten by a cleaning")
                .required(false),
        )
        .arg(
            Arg::with_name(ARG_GROWTH_RATE)
                .short("g")
                .empty_values(false)
                .default_value("2")
                .help("the growth rate of the clause cleaning threshold")
                .required(false),
        )
        .arg(
            Arg::with_name(ARG_QUIET)
                .short("q")
                .takes_value(false)
                .help("do not print the models")
                .required(false),
        )
        .arg(
            Arg::with_name(ARG_HEURISTICS)
                .short("h")
                .empty_values(false)
                .default_value("None")
                .help("the branching heuristics (None, MaxOutDegree, MinInDegree, PathLength<k>, PathLengthModified<k>)")
                .required(false),
        )
        .arg(
            Arg::with_name(ARG_PROOF_OUTPUT)
                .short("c")
                .empty_values(false)
                .help("the file the enumeration proof is written to")
                .required(false),
        )
        .arg(
            Arg::with_name(ARG_LOGGING_LEVEL)
                .long("logging-level")
                .multiple(false)
                .default_value("info")
                .possible_values(&["trace", "debug", "info", "warn", "error", "off"])
                .help("set the minimal logging level"),
        )
}

fn init_logger_with_level(level: log::LevelFilter) {
    let colors = fern::colors::ColoredLevelConfig::new().info(fern::colors::Color::Cyan);
    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{:5}] {} {}",
                colors.color(record.level()),
                chrono::Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .apply()
        .unwrap_or(());
}

struct Config {
    instance_path: PathBuf,
    description_path: Option<PathBuf>,
    required_arguments_path: Option<PathBuf>,
    semantics: Semantics,
    n_models: u64,
    forget_percentage: f64,
    growth_rate: f64,
    quiet: bool,
    heuristics: Heuristics,
    proof_path: Option<PathBuf>,
}

fn existing_file_path(matches: &ArgMatches<'_>, arg: &str, kind: &str) -> Result<Option<PathBuf>> {
    match matches.value_of(arg) {
        None => Ok(None),
        Some(p) => {
            let path = PathBuf::from(p);
            if path.exists() {
                Ok(Some(path))
            } else {
                Err(anyhow::anyhow!("the supplied {} does not exist", kind))
            }
        }
    }
}

impl Config {
    fn from_matches(matches: &ArgMatches<'_>) -> Result<Self> {
        let instance_path = existing_file_path(matches, ARG_INSTANCE, "instance")?
            .expect("the instance is a required argument");
        let description_path = existing_file_path(matches, ARG_DESCRIPTION, "description")?;
        let required_arguments_path =
            existing_file_path(matches, ARG_REQUIRED_ARGUMENTS, "required arguments")?;
        let semantics = Semantics::from_str(matches.value_of(ARG_SEMANTICS).unwrap())
            .context("while parsing the supplied semantics")?;
        let n_models = matches
            .value_of(ARG_NUMBER_OF_MODELS)
            .unwrap()
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("the supplied number of models is invalid"))?;
        if let Some(t) = matches.value_of(ARG_TIMEOUT) {
            match t.parse::<u64>() {
                Ok(timeout) if timeout > 0 => schedule_alarm(timeout),
                _ => return Err(anyhow::anyhow!("the supplied timeout is invalid")),
            }
        }
        let forget_percentage = matches
            .value_of(ARG_FORGET_PERCENTAGE)
            .unwrap()
            .parse::<f64>()
            .ok()
            .filter(|p| (0. ..=1.).contains(p))
            .ok_or_else(|| {
                anyhow::anyhow!("the supplied clause learning forget percentage is invalid")
            })?;
        let growth_rate = matches
            .value_of(ARG_GROWTH_RATE)
            .unwrap()
            .parse::<f64>()
            .ok()
            .filter(|g| *g >= 0.)
            .ok_or_else(|| anyhow::anyhow!("the supplied clause learning growth rate is invalid"))?;
        let heuristics = Heuristics::from_str(matches.value_of(ARG_HEURISTICS).unwrap())
            .context("while parsing the supplied heuristics")?;
        let proof_path = match matches.value_of(ARG_PROOF_OUTPUT) {
            None => None,
            Some(p) => {
                let path = PathBuf::from(p);
                if path.exists() {
                    return Err(anyhow::anyhow!("the supplied proof file already exists"));
                }
                Some(path)
            }
        };
        Ok(Config {
            instance_path,
            description_path,
            required_arguments_path,
            semantics,
            n_models,
            forget_percentage,
            growth_rate,
            quiet: matches.is_present(ARG_QUIET),
            heuristics,
            proof_path,
        })
    }
}

fn open_file(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!(r#"while opening file "{}""#, path.display()))
}

fn read_instance(config: &Config) -> Result<SetafInstance> {
    let reader = SimpleFormatReader;
    info!("reading instance file {:?}", config.instance_path);
    let mut instance = reader
        .read(&mut open_file(&config.instance_path)?)
        .with_context(|| format!(r#"while reading file "{}""#, config.instance_path.display()))?;
    info!(
        "the instance has {} argument(s) and {} attack(s) after subsumption",
        instance.n_arguments(),
        instance.n_attacks(),
    );
    let mut names = ArgumentNameIndex::default();
    if let Some(path) = &config.description_path {
        info!("reading description file {:?}", path);
        names = reader
            .read_descriptions(&mut instance, &mut open_file(path)?)
            .with_context(|| format!(r#"while reading file "{}""#, path.display()))?;
    }
    if let Some(path) = &config.required_arguments_path {
        info!("reading required arguments file {:?}", path);
        reader
            .read_required_arguments(&mut instance, &names, &mut open_file(path)?)
            .with_context(|| format!(r#"while reading file "{}""#, path.display()))?;
        info!(
            "{} required argument(s) will be applied",
            instance.required_arguments().len()
        );
    }
    Ok(instance)
}

struct SolvingReport {
    model_count: u64,
    percentage_solved: f64,
    first_model_elapsed: Option<f64>,
    interrupted: Option<InterruptedError>,
}

fn create_proof_file(config: &Config) -> Result<Option<std::io::BufWriter<File>>> {
    match &config.proof_path {
        None => Ok(None),
        Some(path) => Ok(Some(std::io::BufWriter::new(
            File::create(path)
                .with_context(|| format!(r#"while creating proof file "{}""#, path.display()))?,
        ))),
    }
}

fn solve<'a>(
    config: &Config,
    instance: &'a mut SetafInstance,
    proof_file: Option<&'a mut std::io::BufWriter<File>>,
    start_time: Instant,
) -> SolvingReport {
    let mut solver = match config.semantics {
        Semantics::Stable => StableEnumerationSolver::new(instance),
    };
    solver.set_heuristics(config.heuristics);
    solver.set_max_models(config.n_models);
    solver.set_forgetting(config.forget_percentage, config.growth_rate);
    if !config.quiet {
        solver.set_model_handler(Box::new(|n, extension| {
            println!("Model {}", n);
            let names: Vec<&str> = extension.iter().map(|a| a.name()).collect();
            println!("{}", names.join(" "));
        }));
    }
    if let Some(file) = proof_file {
        solver.set_proof_writer(ProofWriter::new(file));
    }
    let interrupted = solver.enumerate_extensions().err();
    SolvingReport {
        model_count: solver.n_models(),
        percentage_solved: solver.percentage_solved(),
        first_model_elapsed: solver
            .first_model_time()
            .map(|t| t.duration_since(start_time).as_secs_f64()),
        interrupted,
    }
}

fn print_summary(report: &SolvingReport, start_time: Instant) {
    match received_signal() {
        Some(SignalKind::Alarm) => info!("interrupted by timeout"),
        Some(_) => info!("interrupted by signal"),
        None => {}
    }
    info!("finished; models found: {}", report.model_count);
    match report.first_model_elapsed {
        Some(first) => info!(
            "runtime (s): {:.3} (first model: {:.3})",
            start_time.elapsed().as_secs_f64(),
            first
        ),
        None => info!("runtime (s): {:.3}", start_time.elapsed().as_secs_f64()),
    }
    info!("percentage solved: {:.9}", report.percentage_solved * 100.);
}

fn is_interruption(error: &anyhow::Error) -> bool {
    error
        .chain()
        .any(|e| e.downcast_ref::<InterruptedError>().is_some())
}

fn signal_exit_code() -> i32 {
    match received_signal() {
        Some(SignalKind::Alarm) => EXIT_CODE_TIMEOUT,
        _ => EXIT_CODE_SIGNAL,
    }
}

fn run() -> i32 {
    let start_time = Instant::now();
    if let Err(e) = register_signal_handlers() {
        eprintln!("cannot register the signal handlers: {}", e);
        return EXIT_CODE_UNEXPECTED;
    }

    let matches = match create_app().get_matches_safe() {
        Ok(matches) => matches,
        Err(
            e @ clap::Error {
                kind: clap::ErrorKind::HelpDisplayed,
                ..
            },
        ) => {
            println!("{}", e.message);
            return 0;
        }
        Err(e) => {
            eprintln!("{}", e.message);
            return EXIT_CODE_ARGUMENTS;
        }
    };
    let logging_level =
        log::LevelFilter::from_str(matches.value_of(ARG_LOGGING_LEVEL).unwrap()).unwrap();
    init_logger_with_level(logging_level);
    info!(
        "{} {}",
        option_env!("CARGO_PKG_NAME").unwrap_or("rustaf"),
        option_env!("CARGO_PKG_VERSION").unwrap_or("unknown version"),
    );

    let config = match Config::from_matches(&matches) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return EXIT_CODE_ARGUMENTS;
        }
    };

    let mut proof_file = match create_proof_file(&config) {
        Ok(proof_file) => proof_file,
        Err(e) => {
            error!("{:#}", e);
            return EXIT_CODE_ARGUMENTS;
        }
    };

    let mut instance = match read_instance(&config) {
        Ok(instance) => instance,
        Err(e) => {
            error!("{:#}", e);
            return if is_interruption(&e) {
                signal_exit_code()
            } else {
                EXIT_CODE_PARSING
            };
        }
    };

    let report = solve(&config, &mut instance, proof_file.as_mut(), start_time);
    drop(proof_file);
    if report.model_count != 0 {
        if let Some(path) = &config.proof_path {
            // the proof only matters when no model exists
            if let Err(e) = std::fs::remove_file(path) {
                error!(r#"cannot remove proof file "{}": {}"#, path.display(), e);
                return EXIT_CODE_UNEXPECTED;
            }
        }
    }

    print_summary(&report, start_time);
    match report.interrupted {
        None => 0,
        Some(interruption) => match interruption.kind() {
            SignalKind::Alarm => EXIT_CODE_TIMEOUT,
            _ => EXIT_CODE_SIGNAL,
        },
    }
}

fn main() {
    std::process::exit(run());
}
