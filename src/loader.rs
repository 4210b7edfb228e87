use image::{DynamicImage, GenericImageView};
use std::collections::VecDeque;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

use crate::input::Vec2;

// ---------------------------------------------------------------------------
// Decoded image data (CPU side)
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct DecodedImage {
    pub rgba_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    pub format_name: String,
}

impl DecodedImage {
    pub fn native_size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

pub type ImageRef = Arc<DecodedImage>;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("no image path or URL set")]
    EmptySource,
    #[error("{0}: not supported by this source")]
    Unsupported(String),
    #[error("{url}: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<ureq::Transport>,
    },
    #[error("{url}: server answered HTTP {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("{url}: download exceeds {limit} bytes")]
    TooLarge { url: String, limit: u64 },
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("{path}: image has no pixels ({width}x{height})")]
    Degenerate {
        path: String,
        width: u32,
        height: u32,
    },
}

// ---------------------------------------------------------------------------
// Image sources
// ---------------------------------------------------------------------------

/// Fetches and decodes one image reference. Runs on a worker thread and may
/// block.
pub trait ImageSource: Send + Sync {
    fn fetch(&self, reference: &str) -> Result<DecodedImage, ResourceError>;
}

/// Largest body accepted from a remote source.
pub const MAX_DOWNLOAD_BYTES: u64 = 64 * 1024 * 1024;
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub fn is_remote(reference: &str) -> bool {
    let reference = reference.trim();
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Local paths and `file://` URLs, decoded with the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSource;

impl FileSource {
    fn resolve(reference: &str) -> Result<PathBuf, ResourceError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ResourceError::EmptySource);
        }
        if let Some(path) = reference.strip_prefix("file://") {
            return Ok(PathBuf::from(path));
        }
        if is_remote(reference) {
            return Err(ResourceError::Unsupported(reference.to_string()));
        }
        Ok(PathBuf::from(reference))
    }
}

impl ImageSource for FileSource {
    fn fetch(&self, reference: &str) -> Result<DecodedImage, ResourceError> {
        let path = Self::resolve(reference)?;
        decode_file(&path)
    }
}

/// `http://` and `https://` references, downloaded whole and decoded in
/// memory.
pub struct HttpSource {
    agent: ureq::Agent,
    max_bytes: u64,
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpSource {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("multiview/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            max_bytes: MAX_DOWNLOAD_BYTES,
        }
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, ResourceError> {
        let response = self.agent.get(url).call().map_err(|e| match e {
            ureq::Error::Status(status, _) => ResourceError::HttpStatus {
                url: url.to_string(),
                status,
            },
            ureq::Error::Transport(transport) => ResourceError::Network {
                url: url.to_string(),
                source: Box::new(transport),
            },
        })?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(self.max_bytes + 1)
            .read_to_end(&mut bytes)
            .map_err(|source| ResourceError::Io {
                path: url.to_string(),
                source,
            })?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(ResourceError::TooLarge {
                url: url.to_string(),
                limit: self.max_bytes,
            });
        }
        Ok(bytes)
    }
}

impl ImageSource for HttpSource {
    fn fetch(&self, reference: &str) -> Result<DecodedImage, ResourceError> {
        let url = reference.trim();
        if url.is_empty() {
            return Err(ResourceError::EmptySource);
        }
        if !is_remote(url) {
            return Err(ResourceError::Unsupported(url.to_string()));
        }
        let bytes = self.download(url)?;
        log::debug!("Downloaded {} ({} bytes)", url, bytes.len());
        decode_bytes(url, &bytes)
    }
}

/// Sends remote references to `remote` and everything else to `local`.
pub struct RoutedSource<L, R> {
    local: L,
    remote: R,
}

impl<L: ImageSource, R: ImageSource> RoutedSource<L, R> {
    pub fn new(local: L, remote: R) -> Self {
        Self { local, remote }
    }
}

impl<L: ImageSource, R: ImageSource> ImageSource for RoutedSource<L, R> {
    fn fetch(&self, reference: &str) -> Result<DecodedImage, ResourceError> {
        if is_remote(reference) {
            self.remote.fetch(reference)
        } else {
            self.local.fetch(reference)
        }
    }
}

fn decode_file(path: &Path) -> Result<DecodedImage, ResourceError> {
    let display = path.display().to_string();
    let file_size = fs::metadata(path)
        .map_err(|source| ResourceError::Io {
            path: display.clone(),
            source,
        })?
        .len();
    let img = image::open(path).map_err(|source| ResourceError::Decode {
        path: display.clone(),
        source,
    })?;
    let format_name = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("unknown")
        .to_uppercase();
    finish(display, img, file_size, format_name)
}

fn decode_bytes(reference: &str, bytes: &[u8]) -> Result<DecodedImage, ResourceError> {
    let decode_err = |source: image::ImageError| ResourceError::Decode {
        path: reference.to_string(),
        source,
    };
    let format = image::guess_format(bytes).map_err(decode_err)?;
    let img = image::load_from_memory_with_format(bytes, format).map_err(decode_err)?;
    let format_name = format!("{format:?}").to_uppercase();
    finish(reference.to_string(), img, bytes.len() as u64, format_name)
}

fn finish(
    path: String,
    img: DynamicImage,
    file_size: u64,
    format_name: String,
) -> Result<DecodedImage, ResourceError> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(ResourceError::Degenerate {
            path,
            width,
            height,
        });
    }
    Ok(DecodedImage {
        rgba_bytes: img.to_rgba8().into_raw(),
        width,
        height,
        file_size,
        format_name,
    })
}

// ---------------------------------------------------------------------------
// Generations
// ---------------------------------------------------------------------------

/// Monotonic tag attached to every load request. Only outcomes carrying the
/// current generation may be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

#[derive(Debug, Default)]
pub struct LoadTracker {
    current: Generation,
}

impl LoadTracker {
    pub fn current(&self) -> Generation {
        self.current
    }

    pub fn begin(&mut self) -> Generation {
        self.current = Generation(self.current.0 + 1);
        self.current
    }

    /// Make every outstanding request stale without starting a new one.
    pub fn invalidate(&mut self) {
        self.begin();
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation == self.current
    }
}

/// Handle for an in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingLoad {
    pub generation: Generation,
    pub index: usize,
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub generation: Generation,
    pub index: usize,
    pub result: Result<ImageRef, ResourceError>,
}

// ---------------------------------------------------------------------------
// Worker pool (shared between UI and workers via Mutex + Condvar)
// ---------------------------------------------------------------------------

struct Job {
    generation: Generation,
    index: usize,
    reference: String,
}

#[derive(Default)]
struct LoadQueue {
    /// Only the newest request is worth starting; older ones are replaced.
    pending: Option<Job>,
    completed: VecDeque<LoadOutcome>,
    shutdown: bool,
}

type SharedQueue = Arc<(Mutex<LoadQueue>, Condvar)>;

/// Called from a worker after it queued an outcome, so the host wakes up.
pub type Wake = Arc<dyn Fn() + Send + Sync>;

fn lock(queue: &Mutex<LoadQueue>) -> MutexGuard<'_, LoadQueue> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ImageLoader {
    shared: SharedQueue,
    tracker: LoadTracker,
    workers: Vec<JoinHandle<()>>,
}

impl ImageLoader {
    pub fn spawn(source: Arc<dyn ImageSource>, wake: Wake, num_workers: usize) -> Self {
        let shared: SharedQueue = Arc::new((Mutex::new(LoadQueue::default()), Condvar::new()));
        let workers = (0..num_workers.max(1))
            .map(|_| {
                let shared = Arc::clone(&shared);
                let source = Arc::clone(&source);
                let wake = Arc::clone(&wake);
                thread::spawn(move || worker_loop(&shared, source.as_ref(), wake.as_ref()))
            })
            .collect();
        Self {
            shared,
            tracker: LoadTracker::default(),
            workers,
        }
    }

    /// Queue a load for `reference` under a fresh generation. Never blocks.
    pub fn request(&mut self, index: usize, reference: &str) -> PendingLoad {
        let generation = self.tracker.begin();
        log::debug!("[load] request #{} gen {} {:?}", index, generation.0, reference);
        let (queue, cvar) = &*self.shared;
        lock(queue).pending = Some(Job {
            generation,
            index,
            reference: reference.to_string(),
        });
        cvar.notify_one();
        PendingLoad { generation, index }
    }

    /// Abandon whatever is in flight; its result will be discarded.
    pub fn invalidate(&mut self) {
        self.tracker.invalidate();
        let (queue, _) = &*self.shared;
        lock(queue).pending = None;
    }

    /// Next outcome for the current generation, if one is ready. Stale
    /// outcomes found on the way are dropped.
    pub fn poll(&self) -> Option<LoadOutcome> {
        let (queue, _) = &*self.shared;
        let mut state = lock(queue);
        while let Some(outcome) = state.completed.pop_front() {
            if self.tracker.is_current(outcome.generation) {
                return Some(outcome);
            }
            log::debug!(
                "[load] dropping stale result for #{} (gen {} < {})",
                outcome.index,
                outcome.generation.0,
                self.tracker.current().0
            );
        }
        None
    }
}

impl Drop for ImageLoader {
    fn drop(&mut self) {
        {
            let (queue, cvar) = &*self.shared;
            lock(queue).shutdown = true;
            cvar.notify_all();
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(shared: &SharedQueue, source: &dyn ImageSource, wake: &(dyn Fn() + Send + Sync)) {
    let (queue, cvar) = &**shared;
    loop {
        let job = {
            let mut state = lock(queue);
            loop {
                if state.shutdown {
                    return;
                }
                if let Some(job) = state.pending.take() {
                    break job;
                }
                state = cvar.wait(state).unwrap_or_else(PoisonError::into_inner);
            }
        };

        let result = source.fetch(&job.reference).map(Arc::new);
        match &result {
            Ok(img) => log::info!(
                "Loaded #{} {} ({}x{})",
                job.index,
                job.reference,
                img.width,
                img.height
            ),
            Err(e) => log::error!("Failed to load image #{}: {}", job.index, e),
        }

        lock(queue).completed.push_back(LoadOutcome {
            generation: job.generation,
            index: job.index,
            result,
        });
        wake();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    /// Serves solid-colour images whose width encodes the reference, or fails
    /// for references starting with "bad". A reference of "slow" waits on a
    /// gate before completing.
    pub(crate) struct FakeSource {
        pub gate: Mutex<Option<mpsc::Receiver<()>>>,
    }

    impl FakeSource {
        pub(crate) fn new() -> Self {
            Self {
                gate: Mutex::new(None),
            }
        }
    }

    impl ImageSource for FakeSource {
        fn fetch(&self, reference: &str) -> Result<DecodedImage, ResourceError> {
            if reference.is_empty() {
                return Err(ResourceError::EmptySource);
            }
            if reference.starts_with("bad") {
                return Err(ResourceError::Degenerate {
                    path: reference.to_string(),
                    width: 0,
                    height: 0,
                });
            }
            if reference == "slow" {
                let gate = self.gate.lock().unwrap().take();
                if let Some(rx) = gate {
                    let _ = rx.recv_timeout(Duration::from_secs(5));
                }
            }
            let width = reference.len() as u32;
            Ok(DecodedImage {
                rgba_bytes: vec![255; (width * 2 * 4) as usize],
                width,
                height: 2,
                file_size: 0,
                format_name: "FAKE".into(),
            })
        }
    }

    pub(crate) fn wait_for(loader: &ImageLoader) -> Option<LoadOutcome> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(outcome) = loader.poll() {
                return Some(outcome);
            }
            thread::sleep(Duration::from_millis(5));
        }
        None
    }

    fn noop_wake() -> Wake {
        Arc::new(|| {})
    }

    #[test]
    fn tracker_generations_are_monotonic() {
        let mut tracker = LoadTracker::default();
        let a = tracker.begin();
        let b = tracker.begin();
        assert!(b > a);
        assert!(tracker.is_current(b));
        assert!(!tracker.is_current(a));
        tracker.invalidate();
        assert!(!tracker.is_current(b));
    }

    #[test]
    fn loads_and_wakes_host() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let wake: Wake = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let mut loader = ImageLoader::spawn(Arc::new(FakeSource::new()), wake, 2);
        let pending = loader.request(3, "abcd");

        let outcome = wait_for(&loader).expect("outcome");
        assert_eq!(outcome.generation, pending.generation);
        assert_eq!(outcome.index, 3);
        let img = outcome.result.expect("decoded");
        assert_eq!((img.width, img.height), (4, 2));
        assert!(wakes.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn failures_are_reported_not_retried() {
        let mut loader = ImageLoader::spawn(Arc::new(FakeSource::new()), noop_wake(), 1);
        loader.request(0, "bad.png");
        let outcome = wait_for(&loader).expect("outcome");
        assert!(matches!(outcome.result, Err(ResourceError::Degenerate { .. })));
        thread::sleep(Duration::from_millis(50));
        assert!(loader.poll().is_none());
    }

    #[test]
    fn stale_results_are_discarded() {
        let (tx, rx) = mpsc::channel();
        let source = FakeSource::new();
        *source.gate.lock().unwrap() = Some(rx);
        let mut loader = ImageLoader::spawn(Arc::new(source), noop_wake(), 2);

        let slow = loader.request(0, "slow");
        // Give a worker time to pick up the slow job before superseding it.
        thread::sleep(Duration::from_millis(50));
        let fresh = loader.request(1, "fresh");
        assert!(fresh.generation > slow.generation);

        let outcome = wait_for(&loader).expect("outcome");
        assert_eq!(outcome.generation, fresh.generation);
        assert_eq!(outcome.index, 1);

        tx.send(()).expect("release slow job");
        thread::sleep(Duration::from_millis(100));
        assert!(loader.poll().is_none());
    }

    #[test]
    fn invalidate_discards_in_flight_work() {
        let (tx, rx) = mpsc::channel();
        let source = FakeSource::new();
        *source.gate.lock().unwrap() = Some(rx);
        let mut loader = ImageLoader::spawn(Arc::new(source), noop_wake(), 1);

        loader.request(0, "slow");
        thread::sleep(Duration::from_millis(50));
        loader.invalidate();
        tx.send(()).expect("release slow job");
        thread::sleep(Duration::from_millis(100));
        assert!(loader.poll().is_none());
    }

    #[test]
    fn file_source_rejects_empty_and_remote() {
        let source = FileSource;
        assert!(matches!(source.fetch("   "), Err(ResourceError::EmptySource)));
        assert!(matches!(
            source.fetch("https://example.com/a.png"),
            Err(ResourceError::Unsupported(_))
        ));
    }

    #[test]
    fn file_source_reports_missing_and_undecodable_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing.png");
        assert!(matches!(
            FileSource.fetch(&missing.display().to_string()),
            Err(ResourceError::Io { .. })
        ));

        let junk = dir.path().join("junk.png");
        fs::write(&junk, b"definitely not a png").expect("write");
        assert!(matches!(
            FileSource.fetch(&format!("file://{}", junk.display())),
            Err(ResourceError::Decode { .. })
        ));
    }

    #[test]
    fn file_source_decodes_real_images() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tiny.png");
        image::RgbaImage::from_pixel(3, 5, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .expect("save png");
        let img = FileSource.fetch(&path.display().to_string()).expect("decode");
        assert_eq!((img.width, img.height), (3, 5));
        assert_eq!(img.rgba_bytes.len(), 3 * 5 * 4);
        assert_eq!(img.format_name, "PNG");
        assert_eq!(img.native_size(), Vec2::new(3.0, 5.0));
    }

    /// Answers a single request on a loopback port and returns its URL.
    fn serve_once(status: &str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let status = status.to_string();
        thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&body);
        });
        format!("http://{addr}/image.png")
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::RgbaImage::from_pixel(width, height, image::Rgba([1, 2, 3, 255]))
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    /// Answers every reference with a 1x1 image tagged with its own name.
    struct Tagged(&'static str);

    impl ImageSource for Tagged {
        fn fetch(&self, _reference: &str) -> Result<DecodedImage, ResourceError> {
            Ok(DecodedImage {
                rgba_bytes: vec![0; 4],
                width: 1,
                height: 1,
                file_size: 0,
                format_name: self.0.into(),
            })
        }
    }

    #[test]
    fn routed_source_dispatches_on_scheme() {
        let source = RoutedSource::new(Tagged("local"), Tagged("remote"));
        let routed = |reference: &str| source.fetch(reference).expect("fetch").format_name;
        assert_eq!(routed("http://example.com/a.png"), "remote");
        assert_eq!(routed("  https://example.com/a.png"), "remote");
        assert_eq!(routed("file:///tmp/a.png"), "local");
        assert_eq!(routed("pictures/a.png"), "local");
        assert_eq!(routed("httpdocs/a.png"), "local");
    }

    #[test]
    fn http_source_decodes_downloads() {
        let body = png_bytes(4, 3);
        let len = body.len() as u64;
        let url = serve_once("200 OK", body);
        let img = HttpSource::new().fetch(&url).expect("download");
        assert_eq!((img.width, img.height), (4, 3));
        assert_eq!(img.format_name, "PNG");
        assert_eq!(img.file_size, len);
    }

    #[test]
    fn http_status_errors_are_reported() {
        let url = serve_once("404 Not Found", b"gone".to_vec());
        let err = HttpSource::new().fetch(&url).unwrap_err();
        assert!(
            matches!(err, ResourceError::HttpStatus { status: 404, .. }),
            "{err}"
        );
    }

    #[test]
    fn http_body_that_is_not_an_image_fails_to_decode() {
        let url = serve_once("200 OK", b"<html>nope</html>".to_vec());
        let err = HttpSource::new().fetch(&url).unwrap_err();
        assert!(matches!(err, ResourceError::Decode { .. }), "{err}");
    }

    #[test]
    fn oversized_downloads_are_rejected() {
        let url = serve_once("200 OK", png_bytes(8, 8));
        let source = HttpSource {
            max_bytes: 16,
            ..HttpSource::new()
        };
        let err = source.fetch(&url).unwrap_err();
        assert!(matches!(err, ResourceError::TooLarge { limit: 16, .. }), "{err}");
    }

    #[test]
    fn unreachable_hosts_are_network_errors() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);
        let err = HttpSource::new()
            .fetch(&format!("http://{addr}/a.png"))
            .unwrap_err();
        assert!(matches!(err, ResourceError::Network { .. }), "{err}");
    }

    #[test]
    fn http_source_rejects_local_references() {
        assert!(matches!(
            HttpSource::new().fetch("a.png"),
            Err(ResourceError::Unsupported(_))
        ));
        assert!(matches!(
            HttpSource::new().fetch("   "),
            Err(ResourceError::EmptySource)
        ));
    }
}
