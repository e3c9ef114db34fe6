use clap::{App, Arg, SubCommand};
use icocraft::{
    BatchConverter, BatchProgress, ConvertSettings, Converter, IconDir,
    OutputMode, ResizeFilter, TargetSizes,
};
use std::fs;
use std::path::PathBuf;
use std::process;

//===========================================================================//

fn main() {
    env_logger::init();
    let filter_arg = Arg::with_name("filter")
        .takes_value(true)
        .value_name("FILTER")
        .short("f")
        .long("filter")
        .possible_values(&[
            "nearest",
            "triangle",
            "catmull-rom",
            "gaussian",
            "lanczos3",
        ])
        .help("Sets the resampling filter");
    let sizes_arg = Arg::with_name("sizes")
        .takes_value(true)
        .value_name("LIST")
        .short("s")
        .long("sizes")
        .help("Sets the icon sizes, e.g. 16,32,48,256");
    let matches = App::new("icocraft")
        .version("0.1")
        .about("Converts images into ICO files")
        .subcommand(
            SubCommand::with_name("create")
                .about("Creates an ICO file from one image")
                .arg(
                    Arg::with_name("output")
                        .takes_value(true)
                        .value_name("PATH")
                        .short("o")
                        .long("output")
                        .help("Sets output path"),
                )
                .arg(sizes_arg.clone())
                .arg(filter_arg.clone())
                .arg(Arg::with_name("image").required(true)),
        )
        .subcommand(
            SubCommand::with_name("batch")
                .about("Converts many images in parallel")
                .arg(
                    Arg::with_name("outdir")
                        .takes_value(true)
                        .value_name("DIR")
                        .short("d")
                        .long("outdir")
                        .required(true)
                        .help("Sets output directory"),
                )
                .arg(
                    Arg::with_name("per-size")
                        .long("per-size")
                        .help("Writes one ICO file per size"),
                )
                .arg(
                    Arg::with_name("workers")
                        .takes_value(true)
                        .value_name("N")
                        .short("j")
                        .long("workers")
                        .help("Limits the number of worker threads"),
                )
                .arg(sizes_arg)
                .arg(filter_arg)
                .arg(Arg::with_name("image").multiple(true).required(true)),
        )
        .subcommand(
            SubCommand::with_name("list")
                .about("Lists icons in an ICO file")
                .arg(Arg::with_name("ico").required(true)),
        )
        .get_matches();

    if let Some(submatches) = matches.subcommand_matches("create") {
        let settings = settings_from(submatches);
        let sizes = sizes_from(submatches, &settings);
        let input = PathBuf::from(submatches.value_of("image").unwrap());
        let output = match submatches.value_of("output") {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&settings.default_file_name),
        };
        let converter = Converter::new(settings);
        if let Err(error) = converter.write_ico_file(&input, &output, &sizes) {
            fail(&error.to_string());
        }
        println!("Wrote {:?} ({})", output, sizes);
    } else if let Some(submatches) = matches.subcommand_matches("batch") {
        let mut settings = settings_from(submatches);
        if submatches.is_present("per-size") {
            settings.output_mode = OutputMode::PerSize;
        }
        if let Some(workers) = submatches.value_of("workers") {
            match workers.parse() {
                Ok(workers) => settings.max_workers = Some(workers),
                Err(_) => fail(&format!("Invalid worker count {:?}", workers)),
            }
        }
        let sizes = sizes_from(submatches, &settings);
        let mode = settings.output_mode;
        let inputs: Vec<&str> =
            submatches.values_of("image").unwrap().collect();
        let out_dir = submatches.value_of("outdir").unwrap();
        let batch = BatchConverter::new(settings);
        let job = match icocraft::BatchJob::new(inputs, out_dir, sizes) {
            Ok(job) => job.with_mode(mode),
            Err(error) => fail(&error.to_string()),
        };
        let report = |progress: BatchProgress| match progress.current_file {
            Some(name) => println!(
                "[{}/{}] {}",
                progress.completed_files, progress.total_files, name
            ),
            None => println!(
                "[{}/{}]",
                progress.completed_files, progress.total_files
            ),
        };
        let results = match batch.convert(&job, &report) {
            Ok(results) => results,
            Err(error) => fail(&error.to_string()),
        };
        let mut failed = 0;
        for result in results.iter() {
            match result.error() {
                None => {
                    for output in result.outputs() {
                        println!("{:?} -> {:?}", result.input(), output);
                    }
                }
                Some(message) => {
                    failed += 1;
                    println!("{:?}: {}", result.input(), message);
                }
            }
        }
        if failed > 0 {
            process::exit(1);
        }
    } else if let Some(submatches) = matches.subcommand_matches("list") {
        let path = submatches.value_of("ico").unwrap();
        let icondir = match fs::File::open(path).and_then(IconDir::read) {
            Ok(icondir) => icondir,
            Err(error) => fail(&format!("Couldn't read {:?}: {}", path, error)),
        };
        for (index, entry) in icondir.entries().iter().enumerate() {
            let kind = if entry.is_png() { "PNG" } else { "BMP" };
            println!(
                "{:5}: {}x{} {}, {} bpp, {} bytes",
                index,
                entry.width(),
                entry.height(),
                kind,
                entry.bits_per_pixel(),
                entry.data().len()
            );
        }
    }
}

fn settings_from(matches: &clap::ArgMatches) -> ConvertSettings {
    let mut settings = ConvertSettings::default();
    settings.resize_filter = match matches.value_of("filter") {
        Some("nearest") => ResizeFilter::Nearest,
        Some("triangle") => ResizeFilter::Triangle,
        Some("gaussian") => ResizeFilter::Gaussian,
        Some("lanczos3") => ResizeFilter::Lanczos3,
        _ => ResizeFilter::CatmullRom,
    };
    settings
}

fn sizes_from(
    matches: &clap::ArgMatches,
    settings: &ConvertSettings,
) -> TargetSizes {
    let sizes = match matches.value_of("sizes") {
        Some(list) => list.parse::<TargetSizes>(),
        None => settings.default_target_sizes(),
    };
    match sizes {
        Ok(sizes) => sizes,
        Err(error) => fail(&error.to_string()),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("error: {}", message);
    process::exit(1);
}

//===========================================================================//
