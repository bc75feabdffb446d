use std::{
    fs,
    io::{self, Write},
    time::Instant,
};

use inclsim::{cache::PolicySim, config::Config, stats::NamedStats, trace::Trace};

fn main() {
    let mut args = pico_args::Arguments::from_env();

    let fast_forward: u64 = args
        .opt_value_from_str("-f")
        .expect("-f should be an integer")
        .unwrap_or(0);
    let n_refs: u64 = args
        .opt_value_from_str("-n")
        .expect("-n should be an integer")
        .unwrap_or(1_000_000_000);
    let heartbeat_int: u64 = args
        .opt_value_from_str("-h")
        .expect("-h should be an integer")
        .unwrap_or(0);

    let config_json: Option<String> = args.opt_value_from_str("--config").unwrap();
    let config_path: Option<String> = args.opt_value_from_str("-p").unwrap();
    let config: Config = match (config_json, config_path) {
        (Some(text), _) => serde_json::from_str(&text).expect("--config is not valid JSON"),
        (None, Some(path)) => {
            let text = fs::read_to_string(path).expect("Could not find config file");
            serde_json::from_str(&text).expect("Config file is not valid JSON")
        }
        (None, None) => Config::default(),
    };
    let block_shift = config.block_shift();
    let mut caches = config.to_caches().unwrap_or_else(|err| {
        eprintln!("Bad config: {}", err);
        std::process::exit(1);
    });

    let out_path: Option<String> = args.opt_value_from_str("-o").unwrap();
    let json_path: Option<String> = args.opt_value_from_str("--json").unwrap();

    let trace_path: String = args
        .opt_value_from_str("-t")
        .unwrap()
        .expect("Must provide a trace with -t");
    let records_per_batch: usize = args
        .opt_value_from_str("--buffer-size")
        .expect("--buffer-size must be an integer")
        .unwrap_or(1024 * 16);
    let batches_per_queue: usize = args
        .opt_value_from_str("--queue-size")
        .expect("--queue-size must be an integer")
        .unwrap_or(32);

    let trace = Trace::read(trace_path.into(), records_per_batch, batches_per_queue)
        .expect("Could not open trace");

    let start_time = Instant::now();
    let mut skipped: u64 = 0;
    let mut simulated: u64 = 0;
    let mut next_heartbeat = heartbeat_int;

    'run: loop {
        let batch = trace.rec.recv().unwrap();
        for record in &batch {
            if skipped < fast_forward {
                skipped += 1;
                continue;
            }
            for block in record.blocks(block_shift) {
                for cache in caches.iter_mut() {
                    cache.access(block);
                }
            }
            simulated += 1;

            if heartbeat_int != 0 && simulated >= next_heartbeat {
                println!("References: {}", simulated);
                while next_heartbeat <= simulated {
                    next_heartbeat += heartbeat_int;
                }
            }
            if simulated >= n_refs {
                break 'run;
            }
        }
    }

    let mut out: Box<dyn Write> = match out_path {
        Some(path) => Box::new(fs::File::create(path).expect("Cannot open output file")),
        None => Box::new(io::stderr()),
    };

    writeln!(out, "======================================================").unwrap();
    writeln!(out, "References simulated:     {}", simulated).unwrap();
    writeln!(out, "References fast-forwarded: {}", skipped).unwrap();
    for cache in caches.iter() {
        writeln!(out, "======================================================").unwrap();
        cache.dump(&mut *out).unwrap();
    }
    writeln!(out, "======================================================").unwrap();
    writeln!(
        out,
        "\nTime elapsed: {:.2} minutes",
        start_time.elapsed().as_secs_f64() / 60.0
    )
    .unwrap();

    if let Some(path) = json_path {
        let stats: Vec<NamedStats> = caches
            .iter()
            .map(|cache| NamedStats {
                name: cache.name(),
                stats: cache.stats(),
            })
            .collect();
        let stats_file = fs::File::create(path).expect("Cannot open output file");
        serde_json::to_writer_pretty(stats_file, &stats).unwrap();
    }
}
