//! `magicfile`: determine file types with magic(5) rules.

use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use log::{debug, warn};
use scoped_threadpool::Pool;
use tabwriter::TabWriter;
use walkdir::WalkDir;

use magic_tree::{basetype, magic::builtin, Error, MagicSet, BUILTIN, READ_LIMIT};

#[derive(Parser, Debug)]
#[command(name = "magicfile", version, about = "Determines file types with magic(5) rules")]
struct Cli {
    /// Files or directories to identify
    #[arg(required_unless_present = "check")]
    paths: Vec<PathBuf>,

    /// Rule file to use instead of the bundled rules
    #[arg(short = 'm', long = "magic", value_name = "FILE")]
    magic: Option<PathBuf>,

    /// Check the rules and print them in evaluation order
    #[arg(short = 'c', long)]
    check: bool,

    /// Print MIME types instead of descriptions
    #[arg(short = 'i', long = "mime")]
    mime: bool,

    /// Do not prepend file names to output lines
    #[arg(short = 'b', long)]
    brief: bool,

    /// Descend into directories
    #[arg(short = 'r', long)]
    recursive: bool,

    /// Worker threads, one per CPU when 0
    #[arg(short = 'j', long, default_value_t = 0)]
    jobs: u32,
}

fn load_rules(cli: &Cli) -> magic_tree::Result<Option<MagicSet>> {
    let path = match &cli.magic {
        Some(path) => path,
        None if cli.check => {
            return MagicSet::validate(builtin::source().as_bytes(), "builtin").map(Some);
        }
        None => return Ok(None),
    };
    let name = path.display().to_string();
    let reader = BufReader::new(File::open(path)?);
    let set = if cli.check {
        MagicSet::validate(reader, &name)?
    } else {
        MagicSet::from_reader(reader, &name)?
    };
    Ok(Some(set))
}

/// Expand directories when recursing; everything else is checked as given.
fn collect_paths(cli: &Cli) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for path in &cli.paths {
        if cli.recursive && path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                match entry {
                    Ok(entry) => out.push(entry.into_path()),
                    Err(e) => warn!("{}", e),
                }
            }
        } else {
            out.push(path.clone());
        }
    }
    out
}

fn describe(set: &MagicSet, path: &Path, mime: bool) -> String {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) => return format!("cannot open ({})", e),
    };
    if meta.is_dir() {
        return basetype::directory(mime).to_string();
    }
    match magic_tree::read_bytes(path, READ_LIMIT) {
        Ok(bytes) => magic_tree::identify(set, &bytes, mime),
        Err(e) => format!("cannot read ({})", e),
    }
}

fn run(cli: Cli) -> magic_tree::Result<()> {
    let loaded = load_rules(&cli)?;
    let set: &MagicSet = match &loaded {
        Some(set) => set,
        None => &*BUILTIN,
    };

    if cli.check {
        print!("{}", set.dump());
        if cli.paths.is_empty() {
            return Ok(());
        }
    }

    let paths = collect_paths(&cli);
    let mut results = vec![String::new(); paths.len()];
    let threads = if cli.jobs == 0 { num_cpus::get() as u32 } else { cli.jobs };
    debug!("identifying {} files on {} threads", paths.len(), threads);

    let mut pool = Pool::new(threads.max(1));
    let mime = cli.mime;
    pool.scoped(|scope| {
        for (path, slot) in paths.iter().zip(results.iter_mut()) {
            scope.execute(move || *slot = describe(set, path, mime));
        }
    });

    let stdout = io::stdout();
    let mut tw = TabWriter::new(stdout.lock());
    for (path, result) in paths.iter().zip(&results) {
        if cli.brief {
            writeln!(tw, "{}", result)?;
        } else {
            writeln!(tw, "{}:\t{}", path.display(), result)?;
        }
    }
    tw.flush()?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        if let Error::InvalidRules { warnings, .. } = &e {
            for w in warnings {
                eprintln!("magicfile: {}", w);
            }
        }
        eprintln!("magicfile: {}", e);
        process::exit(1);
    }
}
