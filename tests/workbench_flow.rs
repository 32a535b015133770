use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pagesmith::{
    export_notice, Clock, DeviceMode, EditorConfig, EditorSession, Error, FsResourceLoader,
    HtmlSurface, NoticeLevel, StillFormat, Viewport, Workbench,
};
use tokio::sync::Notify;

const SLIDES: &str = r#"<div data-slides><section>First</section><section>Second</section></div>"#;

#[derive(Clone, Default)]
struct GateClock {
    gated: Arc<AtomicBool>,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl Clock for GateClock {
    async fn sleep(&self, _duration: Duration) {
        if !self.gated.swap(true, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

fn config() -> EditorConfig {
    let mut config = EditorConfig::default();
    config.capture.viewport = Viewport {
        width: 100,
        height: 80,
    };
    config.capture.settle_ms = 1;
    config
}

fn workbench() -> Workbench {
    Workbench::new(config(), FsResourceLoader::default()).unwrap()
}

#[tokio::test]
async fn still_before_any_preview_is_an_error_notice() {
    let wb = workbench();
    let result = wb.export_still(StillFormat::Png).await;
    let notice = export_notice(&result);
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.title, "Nothing to capture");
}

#[tokio::test]
async fn edit_refresh_and_export() {
    let wb = workbench();
    let mut session = EditorSession::new("<h1>Title</h1>", "h1 { color: teal }");
    assert!(wb.refresh(&session).await);

    let doc = wb.preview_document().await.unwrap();
    assert!(doc.contains("<style data-pagesmith>h1 { color: teal }</style>"));

    session.set_style("h1 { color: navy }");
    assert!(wb.refresh(&session).await);
    let doc = wb.preview_document().await.unwrap();
    assert!(doc.contains("navy") && !doc.contains("teal"));

    let html = wb.export_document(&session);
    assert_eq!(html.filename, "my-webpage.html");

    let still = wb.export_still(StillFormat::Jpeg).await.unwrap();
    assert_eq!(still.filename, "capture.jpg");
    assert_eq!(still.mime, "image/jpeg");
    assert_eq!(export_notice(&Ok(still)).title, "Download successful!");
}

#[tokio::test]
async fn run_reapplies_even_without_edits() {
    let wb = workbench();
    let mut session = EditorSession::new("<p>x</p>", "");
    wb.refresh(&session).await;
    let before = session.revision();
    let notice = wb.run(&mut session).await;
    assert_eq!(notice.title, "Code executed");
    assert!(session.revision() > before);
    assert!(!wb.refresh(&session).await);
}

#[tokio::test]
async fn distinct_sessions_at_same_revision_both_render() {
    let wb = workbench();
    let a = EditorSession::new("<p>a</p>", "");
    let b = EditorSession::new("<p>b</p>", "");
    assert!(wb.refresh(&a).await);
    assert!(wb.refresh(&b).await);
    assert!(wb.preview_document().await.unwrap().contains("<p>b</p>"));
}

#[tokio::test]
async fn device_mode_sets_capture_size() {
    let wb = workbench();
    let session = EditorSession::new("<p>mobile</p>", "");
    wb.refresh(&session).await;

    let notice = wb.set_device(DeviceMode::Mobile).await;
    assert_eq!(notice.title, "Device changed");
    assert!(notice.description.contains("375"));

    let dl = wb.export_still(StillFormat::Png).await.unwrap();
    let img = image::load_from_memory(&dl.bytes).unwrap();
    assert_eq!((img.width(), img.height()), (750, 1334));

    wb.set_device(DeviceMode::Desktop).await;
    let dl = wb.export_still(StillFormat::Png).await.unwrap();
    let img = image::load_from_memory(&dl.bytes).unwrap();
    assert_eq!((img.width(), img.height()), (200, 160));
}

#[tokio::test]
async fn refresh_waits_for_running_capture() {
    let clock = GateClock::default();
    let wb = Workbench::with_parts(
        config(),
        FsResourceLoader::default(),
        clock.clone(),
        HtmlSurface::new(Viewport {
            width: 100,
            height: 80,
        }),
    )
    .unwrap();
    let slides = EditorSession::new(SLIDES, "");
    let edited = EditorSession::new("<p>edited while capturing</p>", "");
    wb.refresh(&slides).await;

    let capture = wb.export_animation();
    let edit = async {
        clock.entered.notified().await;
        let blocked = tokio::time::timeout(Duration::from_millis(50), wb.refresh(&edited)).await;
        assert!(blocked.is_err(), "refresh must not overtake the capture");
        clock.release.notify_one();
        wb.refresh(&edited).await
    };
    let (capture, refreshed) = tokio::join!(capture, edit);

    let gif = capture.unwrap();
    assert_eq!(gif.filename, "carousel-animation.gif");
    assert!(refreshed);
    assert!(wb
        .preview_document()
        .await
        .unwrap()
        .contains("edited while capturing"));
}

#[tokio::test]
async fn export_during_capture_is_refused_as_busy() {
    let clock = GateClock::default();
    let wb = Workbench::with_parts(
        config(),
        FsResourceLoader::default(),
        clock.clone(),
        HtmlSurface::new(Viewport {
            width: 100,
            height: 80,
        }),
    )
    .unwrap();
    wb.refresh(&EditorSession::new(SLIDES, "")).await;

    let capture = wb.export_animation();
    let second = async {
        clock.entered.notified().await;
        let still = tokio::time::timeout(Duration::from_millis(100), wb.export_still(StillFormat::Png))
            .await
            .expect("a busy export must answer immediately");
        let animation =
            tokio::time::timeout(Duration::from_millis(100), wb.export_animation())
                .await
                .expect("a busy export must answer immediately");
        clock.release.notify_one();
        (still, animation)
    };
    let (first, (still, animation)) = tokio::join!(capture, second);

    assert!(first.is_ok());
    assert!(matches!(still, Err(Error::Busy)));
    assert!(matches!(animation, Err(Error::Busy)));
    assert_eq!(export_notice(&still).title, Error::Busy.title());

    // the gate is open again once the first capture is done
    assert!(wb.export_still(StillFormat::Png).await.is_ok());
}

#[tokio::test]
async fn invalid_config_is_rejected_up_front() {
    let mut config = config();
    config.capture.scale_factor = 0.0;
    assert!(Workbench::new(config, FsResourceLoader::default()).is_err());
}
