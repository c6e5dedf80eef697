// Presentation sinks for normalized posts.
//
// Every sink owns its writer behind a Mutex. A post's lines are written
// while holding the lock, so multi-line content (media captions) is never
// interleaved with another post even when workers share the writer.

use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::thread;

use serde::Serialize;
use socialfeed_common::Post;
use tracing::debug;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Something that can show a batch of posts.
pub trait PostSink: Send + Sync {
    fn present(&self, label: &str, posts: &[Post]) -> io::Result<()>;

    /// Show a raw account record, or report that none was fetched.
    fn present_account(&self, body: Option<&str>) -> io::Result<()>;
}

fn write_account_text<W: Write>(out: &mut W, body: Option<&str>) -> io::Result<()> {
    writeln!(out, "Account:")?;
    match body {
        Some(body) => writeln!(out, "{}", body.trim_end())?,
        None => writeln!(out, "No account data.")?,
    }
    out.flush()
}

/// `[2024-01-01 00:00:00] content`
pub fn format_post(post: &Post) -> String {
    format!(
        "[{}] {}",
        post.created_time.format(TIME_FORMAT),
        post.content
    )
}

fn lock<W>(out: &Mutex<W>) -> io::Result<MutexGuard<'_, W>> {
    out.lock()
        .map_err(|_| io::Error::other("output writer lock poisoned"))
}

fn into_writer<W>(out: Mutex<W>) -> W {
    out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// ConsoleSink
// ---------------------------------------------------------------------------

/// Sequential text output, one post per block.
pub struct ConsoleSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        into_writer(self.out)
    }
}

impl<W: Write + Send> PostSink for ConsoleSink<W> {
    fn present(&self, label: &str, posts: &[Post]) -> io::Result<()> {
        let mut out = lock(&self.out)?;
        writeln!(out, "{label}:")?;

        if posts.is_empty() {
            writeln!(out, "No posts found.")?;
        } else {
            for post in posts {
                writeln!(out, "{}", format_post(post))?;
                writeln!(out)?;
            }
        }

        out.flush()
    }

    fn present_account(&self, body: Option<&str>) -> io::Result<()> {
        write_account_text(&mut *lock(&self.out)?, body)
    }
}

// ---------------------------------------------------------------------------
// JsonSink
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct JsonLine<'a> {
    source: &'a str,
    #[serde(flatten)]
    post: &'a Post,
}

#[derive(Serialize)]
struct AccountLine {
    source: &'static str,
    account: serde_json::Value,
}

/// One JSON object per line, tagged with the batch label.
pub struct JsonSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        into_writer(self.out)
    }
}

impl<W: Write + Send> PostSink for JsonSink<W> {
    fn present(&self, label: &str, posts: &[Post]) -> io::Result<()> {
        let mut out = lock(&self.out)?;
        for post in posts {
            serde_json::to_writer(&mut *out, &JsonLine { source: label, post })?;
            writeln!(out)?;
        }
        out.flush()
    }

    /// Bodies that are not JSON are carried as a string.
    fn present_account(&self, body: Option<&str>) -> io::Result<()> {
        let account = match body {
            Some(body) => serde_json::from_str(body)
                .unwrap_or_else(|_| serde_json::Value::String(body.to_string())),
            None => serde_json::Value::Null,
        };

        let mut out = lock(&self.out)?;
        serde_json::to_writer(
            &mut *out,
            &AccountLine {
                source: "account",
                account,
            },
        )?;
        writeln!(out)?;
        out.flush()
    }
}

// ---------------------------------------------------------------------------
// ParallelConsoleSink
// ---------------------------------------------------------------------------

/// Fans an already-fetched batch out over scoped worker threads.
///
/// Posts are split into contiguous chunks of `ceil(n / workers)`; worker `k`
/// (1-based) prints its chunk in order. Output across workers interleaves
/// freely, but each post line is written under the lock.
pub struct ParallelConsoleSink<W> {
    workers: NonZeroUsize,
    out: Mutex<W>,
}

impl<W: Write + Send> ParallelConsoleSink<W> {
    pub fn new(workers: NonZeroUsize, out: W) -> Self {
        Self {
            workers,
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        into_writer(self.out)
    }

    fn run_worker(&self, worker: usize, chunk: &[Post]) -> io::Result<()> {
        debug!(worker, count = chunk.len(), "Worker started");
        writeln!(lock(&self.out)?, "Worker {worker} started.")?;

        for post in chunk {
            let mut out = lock(&self.out)?;
            writeln!(out, "Worker {worker}: {}", format_post(post))?;
        }

        writeln!(lock(&self.out)?, "Worker {worker} finished.")?;
        Ok(())
    }
}

impl<W: Write + Send> PostSink for ParallelConsoleSink<W> {
    fn present(&self, label: &str, posts: &[Post]) -> io::Result<()> {
        {
            let mut out = lock(&self.out)?;
            writeln!(out, "{label}:")?;
            if posts.is_empty() {
                writeln!(out, "No posts found.")?;
                return out.flush();
            }
        }

        let chunk_size = posts.len().div_ceil(self.workers.get());

        let results: Vec<io::Result<()>> = thread::scope(|scope| {
            let handles: Vec<_> = posts
                .chunks(chunk_size)
                .enumerate()
                .map(|(i, chunk)| scope.spawn(move || self.run_worker(i + 1, chunk)))
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(io::Error::other("output worker panicked")))
                })
                .collect()
        });

        results.into_iter().collect::<io::Result<()>>()?;
        lock(&self.out)?.flush()
    }

    fn present_account(&self, body: Option<&str>) -> io::Result<()> {
        write_account_text(&mut *lock(&self.out)?, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn post(id: &str, content: &str) -> Post {
        Post {
            id: id.to_string(),
            content: content.to_string(),
            created_time: Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap(),
        }
    }

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn format_post_uses_bracketed_time() {
        assert_eq!(format_post(&post("1", "hi")), "[2024-01-01 09:30:00] hi");
    }

    #[test]
    fn epoch_time_is_still_printed() {
        let p = Post {
            created_time: DateTime::<Utc>::UNIX_EPOCH,
            ..post("1", "old")
        };
        assert_eq!(format_post(&p), "[1970-01-01 00:00:00] old");
    }

    // --- ConsoleSink ---

    #[test]
    fn console_prints_label_and_blocks() {
        let sink = ConsoleSink::new(Vec::new());
        sink.present("Facebook posts", &[post("1", "a"), post("2", "b")])
            .unwrap();
        assert_eq!(
            text(sink.into_inner()),
            "Facebook posts:\n[2024-01-01 09:30:00] a\n\n[2024-01-01 09:30:00] b\n\n"
        );
    }

    #[test]
    fn console_reports_empty_batch() {
        let sink = ConsoleSink::new(Vec::new());
        sink.present("Instagram media", &[]).unwrap();
        assert_eq!(text(sink.into_inner()), "Instagram media:\nNo posts found.\n");
    }

    // --- JsonSink ---

    #[test]
    fn json_emits_one_object_per_line() {
        let sink = JsonSink::new(Vec::new());
        sink.present("facebook", &[post("1", "a"), post("2", "b\nc")])
            .unwrap();
        let out = text(sink.into_inner());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["source"], "facebook");
        assert_eq!(first["id"], "1");
        assert_eq!(first["created_time"], "2024-01-01T09:30:00Z");

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["content"], "b\nc");
    }

    #[test]
    fn json_empty_batch_writes_nothing() {
        let sink = JsonSink::new(Vec::new());
        sink.present("facebook", &[]).unwrap();
        assert!(sink.into_inner().is_empty());
    }

    #[test]
    fn console_prints_account_or_placeholder() {
        let sink = ConsoleSink::new(Vec::new());
        sink.present_account(Some("{\"id\":\"1\",\"username\":\"acme\"}\n"))
            .unwrap();
        sink.present_account(None).unwrap();
        assert_eq!(
            text(sink.into_inner()),
            "Account:\n{\"id\":\"1\",\"username\":\"acme\"}\nAccount:\nNo account data.\n"
        );
    }

    #[test]
    fn json_account_is_embedded_as_an_object() {
        let sink = JsonSink::new(Vec::new());
        sink.present_account(Some(r#"{"id":"1","username":"acme"}"#))
            .unwrap();
        sink.present_account(Some("not json")).unwrap();
        sink.present_account(None).unwrap();
        let out = text(sink.into_inner());
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["source"], "account");
        assert_eq!(lines[0]["account"]["username"], "acme");
        assert_eq!(lines[1]["account"], "not json");
        assert!(lines[2]["account"].is_null());
    }

    /// Writer whose reader end has gone away, like `| head -c0`.
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn closed_output_is_an_error_not_a_panic() {
        let err = ConsoleSink::new(ClosedPipe)
            .present_account(Some("{}"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        let err = JsonSink::new(ClosedPipe)
            .present_account(None)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    // --- ParallelConsoleSink ---

    fn posts(n: usize) -> Vec<Post> {
        (0..n)
            .map(|i| post(&i.to_string(), &format!("post {i}")))
            .collect()
    }

    #[test]
    fn parallel_prints_every_post_exactly_once() {
        let sink = ParallelConsoleSink::new(NonZeroUsize::new(3).unwrap(), Vec::new());
        sink.present("Facebook posts", &posts(10)).unwrap();
        let out = text(sink.into_inner());

        for i in 0..10 {
            let needle = format!("] post {i}\n");
            assert_eq!(out.matches(&needle).count(), 1, "post {i} in:\n{out}");
        }
    }

    #[test]
    fn parallel_chunks_are_contiguous_and_ordered_per_worker() {
        // 10 posts over 3 workers -> chunks of 4, 4, 2.
        let sink = ParallelConsoleSink::new(NonZeroUsize::new(3).unwrap(), Vec::new());
        sink.present("Facebook posts", &posts(10)).unwrap();
        let out = text(sink.into_inner());

        let worker_posts = |k: usize| -> Vec<String> {
            let prefix = format!("Worker {k}: [2024-01-01 09:30:00] ");
            out.lines()
                .filter_map(|l| l.strip_prefix(prefix.as_str()).map(str::to_string))
                .collect()
        };

        assert_eq!(worker_posts(1), ["post 0", "post 1", "post 2", "post 3"]);
        assert_eq!(worker_posts(2), ["post 4", "post 5", "post 6", "post 7"]);
        assert_eq!(worker_posts(3), ["post 8", "post 9"]);
        assert!(out.contains("Worker 3 finished."));
    }

    #[test]
    fn more_workers_than_posts_spawns_one_per_post() {
        let sink = ParallelConsoleSink::new(NonZeroUsize::new(8).unwrap(), Vec::new());
        sink.present("Facebook posts", &posts(2)).unwrap();
        let out = text(sink.into_inner());
        assert!(out.contains("Worker 2 finished."));
        assert!(!out.contains("Worker 3 started."));
    }

    #[test]
    fn multi_line_content_is_not_split() {
        let batch: Vec<Post> = (0..20)
            .map(|i| post(&i.to_string(), &format!("caption {i}\nMedia URL: https://x/{i}")))
            .collect();
        let sink = ParallelConsoleSink::new(NonZeroUsize::new(4).unwrap(), Vec::new());
        sink.present("Instagram media", &batch).unwrap();
        let out = text(sink.into_inner());

        for i in 0..20 {
            let needle = format!("caption {i}\nMedia URL: https://x/{i}\n");
            assert!(out.contains(&needle), "record {i} was split:\n{out}");
        }
    }

    #[test]
    fn parallel_reports_empty_batch() {
        let sink = ParallelConsoleSink::new(NonZeroUsize::new(2).unwrap(), Vec::new());
        sink.present("Facebook posts", &[]).unwrap();
        assert_eq!(text(sink.into_inner()), "Facebook posts:\nNo posts found.\n");
    }
}
