use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;

use mail_threading::mailbox::load_mailbox;
use mail_threading::threading::collect_thread_members;
use mail_threading::{ThreadBuilder, ThreadNode, ThreadingConfig, ThreadingError, init_logger};

#[derive(Parser, Debug)]
#[command(
    name = "thread_messages",
    about = "Group mail messages into conversation threads"
)]
struct Args {
    /// Mailboxes to thread: JSON files with a message array, or directories
    /// with one raw message per file. Each one is threaded on its own.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Only use References/In-Reply-To, never merge threads by subject.
    #[arg(long)]
    no_subject_grouping: bool,

    /// Keep at most this many (most recent) messages per mailbox; 0 for all.
    #[arg(long)]
    max_messages: Option<usize>,

    /// Print each thread as a flat list of (id, depth) pairs.
    #[arg(long)]
    flat: bool,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

/// Nested JSON output recurses once per tree level while serializing; deeper
/// mailboxes are printed flat instead.
const MAX_NESTED_DEPTH: usize = 10_000;

#[derive(Serialize)]
struct FlatThread {
    root: Option<String>,
    members: Vec<(String, usize)>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ThreadOutput {
    Nested(Vec<ThreadNode>),
    Flat(Vec<FlatThread>),
}

#[derive(Serialize)]
struct MailboxOutput {
    source: PathBuf,
    threads: ThreadOutput,
}

fn thread_mailbox(
    path: &Path,
    config: &ThreadingConfig,
    flat: bool,
) -> Result<MailboxOutput, ThreadingError> {
    let messages = load_mailbox(path, config)?;
    let threads = ThreadBuilder::from_config(config).build(&messages);

    log::info!(
        "{}: {} messages in {} threads",
        path.display(),
        messages.len(),
        threads.len()
    );

    let threads = render_threads(threads, flat, path);

    Ok(MailboxOutput {
        source: path.to_path_buf(),
        threads,
    })
}

fn render_threads(threads: Vec<ThreadNode>, flat: bool, path: &Path) -> ThreadOutput {
    let too_deep = !flat && threads.iter().any(|thread| thread.depth() > MAX_NESTED_DEPTH);
    if too_deep {
        log::warn!(
            "{}: thread deeper than {} levels, printing flat output",
            path.display(),
            MAX_NESTED_DEPTH
        );
    }

    if flat || too_deep {
        ThreadOutput::Flat(
            threads
                .iter()
                .map(|thread| FlatThread {
                    root: thread.id.clone(),
                    members: collect_thread_members(thread),
                })
                .collect(),
        )
    } else {
        ThreadOutput::Nested(threads)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();

    let args = Args::parse();

    let mut config = ThreadingConfig::from_env();
    if args.no_subject_grouping {
        config.group_by_subject = false;
    }
    if let Some(limit) = args.max_messages {
        config = config.with_max_messages(limit);
    }

    // Mailboxes are independent, so they can be threaded side by side
    let results: Vec<Result<MailboxOutput, ThreadingError>> = args
        .inputs
        .par_iter()
        .map(|path| thread_mailbox(path, &config, args.flat))
        .collect();

    let mut outputs = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(output) => outputs.push(output),
            Err(err) => {
                writeln!(io::stderr(), "error: {err}")?;
                std::process::exit(1);
            }
        }
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&outputs).map_err(ThreadingError::from)?
    } else {
        serde_json::to_string(&outputs).map_err(ThreadingError::from)?
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}")?;

    Ok(())
}
