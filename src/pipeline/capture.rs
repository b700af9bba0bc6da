//! Slide capture: walk the deck and snapshot every slide as a one-page PDF.
//!
//! Strictly sequential. Navigation mutates the single live document, so
//! slide `i + 1` is never touched before slide `i` has been printed, and the
//! artifacts come back in index order.

use crate::browser::{CaptureOptions, RenderSession};
use crate::config::ConversionConfig;
use crate::error::{Html2PdfError, SlideError};
use crate::output::SlideReport;
use crate::pipeline::format::PageDimensions;
use crate::pipeline::navigate::{self, NavigationOutcome};
use crate::pipeline::slides::DetectedSlides;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Single-page PDF bytes for one slide.
#[derive(Debug, Clone)]
pub struct SlideArtifact {
    /// 0-based slide index.
    pub index: usize,
    pub bytes: Vec<u8>,
}

/// Artifacts plus per-slide reports, both in index order.
#[derive(Debug)]
pub struct CaptureRun {
    pub artifacts: Vec<SlideArtifact>,
    pub reports: Vec<SlideReport>,
}

/// Navigate to and print every detected slide.
///
/// Navigation problems are recorded and the slide captured anyway; a failed
/// print aborts the whole run with [`Html2PdfError::CaptureFailed`].
pub fn capture_all(
    session: &mut dyn RenderSession,
    slides: &DetectedSlides,
    dims: PageDimensions,
    config: &ConversionConfig,
) -> Result<CaptureRun, Html2PdfError> {
    let total = slides.total_count;
    let options = CaptureOptions::for_page(dims, config);
    let settle = Duration::from_millis(config.wait_time_ms);
    let mut artifacts = Vec::new();
    let mut reports = Vec::new();

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total);
    }

    for slide in slides.descriptors() {
        let slide_num = slide.number();
        if let Some(ref cb) = config.progress_callback {
            cb.on_slide_start(slide_num, total);
        }

        let mut navigation = None;
        let mut warning = None;
        if total > 1 {
            match navigate::navigate_to(session, slide.index, config) {
                NavigationOutcome::Navigated(name) => navigation = Some(name.to_string()),
                NavigationOutcome::Unresolved(detail) => {
                    if let Some(ref cb) = config.progress_callback {
                        cb.on_navigation_warning(slide_num, total, &detail);
                    }
                    warning = Some(SlideError::NavigationFailed {
                        slide: slide_num,
                        detail,
                    });
                }
            }
            thread::sleep(settle);
        }

        let bytes = session
            .print_page(&options)
            .map_err(|e| Html2PdfError::CaptureFailed {
                slide: slide_num,
                detail: e.to_string(),
            })?;
        info!("Captured slide {}/{} ({} bytes)", slide_num, total, bytes.len());
        debug!("Slide {} print options: {:?}", slide_num, options);

        if let Some(ref cb) = config.progress_callback {
            cb.on_slide_captured(slide_num, total, bytes.len());
        }
        reports.push(SlideReport {
            slide_num,
            navigation,
            bytes: bytes.len(),
            warning,
        });
        artifacts.push(SlideArtifact {
            index: slide.index,
            bytes,
        });
    }

    Ok(CaptureRun { artifacts, reports })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{Action, FakeSession};
    use crate::config::NavigationMethod;
    use crate::pipeline::slides::{self, DetectionMethod, COUNTER_SELECTOR};
    use crate::progress::ConversionProgressCallback;
    use std::sync::{Arc, Mutex};

    fn fast() -> ConversionConfig {
        ConversionConfig::builder()
            .wait_time_ms(0)
            .key_delay_ms(0)
            .build()
            .unwrap()
    }

    fn deck(n: usize) -> DetectedSlides {
        DetectedSlides {
            total_count: n,
            method: DetectionMethod::Selector(".slide".into()),
        }
    }

    #[test]
    fn captures_every_slide_in_order() {
        let mut session = FakeSession::with_slides(".slide", 4);
        let run = capture_all(&mut session, &deck(4), PageDimensions::landscape(), &fast()).unwrap();
        assert_eq!(run.artifacts.len(), 4);
        assert_eq!(
            run.artifacts.iter().map(|a| a.index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
        assert_eq!(session.printed_slides(), vec![0, 1, 2, 3]);
        assert!(run.reports.iter().all(|r| r.navigation.as_deref() == Some("arrow-keys")));
    }

    #[test]
    fn single_slide_skips_navigation() {
        let mut session = FakeSession::new();
        let slides = DetectedSlides {
            total_count: 1,
            method: DetectionMethod::SinglePage,
        };
        let run = capture_all(&mut session, &slides, PageDimensions::portrait(), &fast()).unwrap();
        assert_eq!(run.artifacts.len(), 1);
        assert_eq!(session.actions, vec![Action::Print(0)]);
        assert!(run.reports[0].navigation.is_none());
        assert!(run.reports[0].warning.is_none());
    }

    #[test]
    fn failed_navigation_still_captures() {
        let mut session = FakeSession::with_slides(".slide", 3);
        let config = ConversionConfig::builder()
            .wait_time_ms(0)
            .navigation_method(NavigationMethod::Function)
            .build()
            .unwrap();
        let run = capture_all(&mut session, &deck(3), PageDimensions::landscape(), &config).unwrap();
        assert_eq!(run.artifacts.len(), 3);
        // Nothing moved the deck, so every snapshot shows the first slide.
        assert_eq!(session.printed_slides(), vec![0, 0, 0]);
        assert!(run.reports.iter().all(|r| matches!(
            r.warning,
            Some(SlideError::NavigationFailed { .. })
        )));
    }

    #[test]
    fn print_failure_is_fatal() {
        let mut session = FakeSession::with_slides(".slide", 3);
        session.fail_print_at = Some(1);
        let err = capture_all(&mut session, &deck(3), PageDimensions::landscape(), &fast())
            .unwrap_err();
        assert!(matches!(err, Html2PdfError::CaptureFailed { slide: 2, .. }));
    }

    #[test]
    fn artifacts_sized_to_dimensions() {
        let mut session = FakeSession::new();
        let dims = PageDimensions::new(1080, 1920).unwrap();
        let run = capture_all(&mut session, &deck(1), dims, &fast()).unwrap();
        let doc = lopdf::Document::load_mem(&run.artifacts[0].bytes).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let media = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(media[2].as_float().unwrap(), 810.0);
        assert_eq!(media[3].as_float().unwrap(), 1440.0);
    }

    #[test]
    fn huge_counter_deck_captures_one_page() {
        let mut session =
            FakeSession::new().with_text(COUNTER_SELECTOR, "1 / 18446744073709551615");
        let slides = slides::detect(&session, &fast()).unwrap();
        assert_eq!(slides.total_count, 1);
        let run = capture_all(&mut session, &slides, PageDimensions::landscape(), &fast()).unwrap();
        assert_eq!(run.artifacts.len(), 1);
        assert_eq!(session.actions, vec![Action::Print(0)]);
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ConversionProgressCallback for Recorder {
        fn on_conversion_start(&self, total_slides: usize) {
            self.events.lock().unwrap().push(format!("start {total_slides}"));
        }
        fn on_slide_start(&self, slide_num: usize, _total_slides: usize) {
            self.events.lock().unwrap().push(format!("slide {slide_num}"));
        }
        fn on_navigation_warning(&self, slide_num: usize, _total_slides: usize, _detail: &str) {
            self.events.lock().unwrap().push(format!("warn {slide_num}"));
        }
        fn on_slide_captured(&self, slide_num: usize, _total_slides: usize, _bytes: usize) {
            self.events.lock().unwrap().push(format!("done {slide_num}"));
        }
    }

    #[test]
    fn progress_events_in_order() {
        let recorder = Arc::new(Recorder::default());
        let config = ConversionConfig::builder()
            .wait_time_ms(0)
            .navigation_method(NavigationMethod::Dots)
            .progress_callback(recorder.clone())
            .build()
            .unwrap();
        let mut session = FakeSession::with_slides(".slide", 2).with_dots(1);
        capture_all(&mut session, &deck(2), PageDimensions::landscape(), &config).unwrap();
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["start 2", "slide 1", "done 1", "slide 2", "warn 2", "done 2"]
        );
    }
}
