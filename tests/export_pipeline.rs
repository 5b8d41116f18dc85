use std::fs;

use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tombola::export::{
    ArtifactHandle, DocumentError, DocumentSink, EncodedImage, Placement, RasterError,
    RasterOptions, Rasterizer, RenderAdapter, RenderError,
};
use tombola::{
    CancelToken, CardRecord, CardStyle, ExportConfig, ExportError, ExportPipeline, Progress,
    ProgressStage, export_cards_to_pdf, generate_with,
};

fn cards(count: usize, label: &str) -> Vec<CardRecord> {
    let mut rng = StdRng::seed_from_u64(7);
    generate_with(&mut rng, count, label).expect("generate cards")
}

fn config() -> ExportConfig {
    ExportConfig::default().without_delays()
}

#[derive(Default)]
struct FakeRenderer {
    failing: Vec<u32>,
    exhausted: bool,
    opened: usize,
    closed: usize,
    rendered: usize,
}

impl RenderAdapter for FakeRenderer {
    type Artifact = u32;

    fn open_staging(&mut self) -> Result<(), RenderError> {
        self.opened += 1;
        Ok(())
    }

    fn render(&mut self, card: &CardRecord) -> Result<u32, RenderError> {
        self.rendered += 1;
        if self.failing.contains(&card.serial) {
            return Err(if self.exhausted {
                RenderError::ResourceExhausted(format!("card {}", card.serial))
            } else {
                RenderError::Other("boom".to_string())
            });
        }
        Ok(card.serial)
    }

    fn close_staging(&mut self) {
        self.closed += 1;
    }
}

#[derive(Default)]
struct FakeRasterizer {
    exhausted: bool,
}

impl Rasterizer<u32> for FakeRasterizer {
    fn rasterize(
        &mut self,
        serial: &u32,
        _options: &RasterOptions,
    ) -> Result<EncodedImage, RasterError> {
        if self.exhausted {
            return Err(RasterError::ResourceExhausted("canvas too large".to_string()));
        }
        Ok(EncodedImage {
            width: 1,
            height: 1,
            data: vec![*serial as u8],
        })
    }
}

struct RecordingSink {
    pages: usize,
    placed: Vec<(u8, Placement)>,
    saved: Option<String>,
    refuse_pages: bool,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self {
            pages: 1,
            placed: Vec::new(),
            saved: None,
            refuse_pages: false,
        }
    }
}

impl DocumentSink for RecordingSink {
    fn add_page(&mut self) -> Result<(), DocumentError> {
        if self.refuse_pages {
            return Err(DocumentError::Assembly("page tree is read-only".to_string()));
        }
        self.pages += 1;
        Ok(())
    }

    fn add_image(
        &mut self,
        image: &EncodedImage,
        placement: &Placement,
    ) -> Result<(), DocumentError> {
        self.placed.push((image.data[0], *placement));
        Ok(())
    }

    fn save(&mut self, name: &str) -> Result<ArtifactHandle, DocumentError> {
        self.saved = Some(name.to_string());
        Ok(ArtifactHandle {
            name: name.to_string(),
            path: None,
            pages: self.pages,
            bytes: 0,
        })
    }
}

#[test]
fn three_cards_share_the_first_page() {
    let config = config();
    let cards = cards(3, "Friday Night");
    let mut renderer = FakeRenderer::default();
    let mut rasterizer = FakeRasterizer::default();
    let mut sink = RecordingSink::default();
    let mut events: Vec<Progress> = Vec::new();
    let mut record = |p: &Progress| events.push(p.clone());

    let report = ExportPipeline::new(&config, &mut renderer, &mut rasterizer, &mut sink)
        .run(&cards, &mut record)
        .expect("export");

    assert_eq!(report.placed, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(report.pages, 1);
    assert_eq!(report.artifact.name, "Friday Night_bingo_cards_3tarjetas.pdf");
    let slots: Vec<(usize, f32, f32)> = sink
        .placed
        .iter()
        .map(|(_, p)| (p.page, p.x, p.y))
        .collect();
    assert_eq!(slots, vec![(1, 10.0, 10.0), (1, 110.0, 10.0), (1, 10.0, 150.0)]);
    assert!(sink.placed.iter().all(|(_, p)| (p.width, p.height) == (90.0, 130.0)));
    assert_eq!((renderer.opened, renderer.closed), (1, 1));

    let last = events.last().expect("progress");
    assert_eq!((last.percent, last.stage), (100, ProgressStage::Done));
}

#[test]
fn one_batch_event_per_batch_and_percent_never_drops() {
    let config = config();
    let cards = cards(25, "Batches");
    let (mut renderer, mut rasterizer, mut sink): (FakeRenderer, FakeRasterizer, RecordingSink) =
        Default::default();
    let mut events: Vec<Progress> = Vec::new();
    let mut record = |p: &Progress| events.push(p.clone());

    let report = ExportPipeline::new(&config, &mut renderer, &mut rasterizer, &mut sink)
        .run(&cards, &mut record)
        .expect("export");
    assert_eq!(report.batches, 3);
    assert_eq!(report.pages, 7);

    let stages: Vec<ProgressStage> = events.iter().map(|p| p.stage).collect();
    assert_eq!(
        stages,
        vec![
            ProgressStage::Preparing,
            ProgressStage::Batch { index: 0, count: 3 },
            ProgressStage::Batch { index: 1, count: 3 },
            ProgressStage::Batch { index: 2, count: 3 },
            ProgressStage::Finalizing,
            ProgressStage::Done,
        ]
    );
    let percents: Vec<u8> = events.iter().map(|p| p.percent).collect();
    assert_eq!(percents, vec![5, 10, 38, 66, 90, 100]);
}

#[test]
fn a_failing_card_is_skipped_without_leaving_a_gap() {
    let config = config();
    let cards = cards(12, "Skip");
    let mut renderer = FakeRenderer {
        failing: vec![5],
        ..Default::default()
    };
    let mut rasterizer = FakeRasterizer::default();
    let mut sink = RecordingSink::default();

    let report = ExportPipeline::new(&config, &mut renderer, &mut rasterizer, &mut sink)
        .run(&cards, &mut |_: &Progress| {})
        .expect("export");

    assert_eq!((report.total, report.placed, report.failed), (12, 11, 1));
    assert_eq!(report.pages, 3);
    assert_eq!(renderer.rendered, 12);
    let (serial, slot) = sink.placed[4];
    assert_eq!(serial, 6);
    assert_eq!((slot.page, slot.x, slot.y), (2, 10.0, 10.0));
    assert!(sink.placed.iter().all(|(s, _)| *s != 5));
}

#[test]
fn empty_input_touches_nothing() {
    let config = config();
    let mut renderer = FakeRenderer::default();
    let mut rasterizer = FakeRasterizer::default();
    let mut sink = RecordingSink::default();
    let mut events = 0;

    let err = ExportPipeline::new(&config, &mut renderer, &mut rasterizer, &mut sink)
        .run(&[], &mut |_: &Progress| events += 1)
        .unwrap_err();

    assert!(matches!(err, ExportError::EmptyInput));
    assert_eq!(events, 0);
    assert_eq!(renderer.opened, 0);
    assert!(sink.saved.is_none());
}

#[test]
fn mostly_failing_export_aborts_and_closes_staging() {
    let config = config();
    let cards = cards(4, "Broken");
    let mut renderer = FakeRenderer {
        failing: vec![1, 2, 3, 4],
        ..Default::default()
    };
    let mut rasterizer = FakeRasterizer::default();
    let mut sink = RecordingSink::default();
    let mut events: Vec<Progress> = Vec::new();

    let err = ExportPipeline::new(&config, &mut renderer, &mut rasterizer, &mut sink)
        .run(&cards, &mut |p: &Progress| events.push(p.clone()))
        .unwrap_err();

    assert!(matches!(err, ExportError::Failed { .. }), "{:?}", err);
    assert_eq!(renderer.rendered, 3);
    assert_eq!((renderer.opened, renderer.closed), (1, 1));
    assert!(sink.saved.is_none());
    let last = events.last().expect("progress");
    assert_eq!(last.stage, ProgressStage::Failed);
    assert_eq!(last.percent, 10);
}

#[test]
fn exhaustion_surfaces_as_too_many_cards() {
    let config = config();
    let cards = cards(2, "Huge");
    let mut renderer = FakeRenderer::default();
    let mut rasterizer = FakeRasterizer { exhausted: true };
    let mut sink = RecordingSink::default();

    let err = ExportPipeline::new(&config, &mut renderer, &mut rasterizer, &mut sink)
        .run(&cards, &mut |_: &Progress| {})
        .unwrap_err();

    assert!(err.is_volume_related(), "{:?}", err);
    assert!(err.to_string().contains("fewer cards"));
}

#[test]
fn page_refusal_is_fatal() {
    let config = config();
    let cards = cards(5, "Pages");
    let mut renderer = FakeRenderer::default();
    let mut rasterizer = FakeRasterizer::default();
    let mut sink = RecordingSink {
        refuse_pages: true,
        ..Default::default()
    };

    let err = ExportPipeline::new(&config, &mut renderer, &mut rasterizer, &mut sink)
        .run(&cards, &mut |_: &Progress| {})
        .unwrap_err();

    assert!(matches!(err, ExportError::Failed { .. }), "{:?}", err);
    assert_eq!(sink.placed.len(), 4);
    assert_eq!(renderer.closed, 1);
}

#[test]
fn cancelling_stops_at_the_next_batch() {
    let config = config();
    let cards = cards(25, "Cancel");
    let mut renderer = FakeRenderer::default();
    let mut rasterizer = FakeRasterizer::default();
    let mut sink = RecordingSink::default();
    let token = CancelToken::new();
    let trigger = token.clone();

    let err = ExportPipeline::new(&config, &mut renderer, &mut rasterizer, &mut sink)
        .with_cancel(token)
        .run(&cards, &mut |p: &Progress| {
            if p.stage == (ProgressStage::Batch { index: 0, count: 3 }) {
                trigger.cancel();
            }
        })
        .unwrap_err();

    assert!(matches!(
        err,
        ExportError::Cancelled {
            processed: 10,
            total: 25
        }
    ));
    assert_eq!(sink.placed.len(), 10);
    assert!(sink.saved.is_none());
    assert_eq!(renderer.closed, 1);
}

#[test]
fn writes_a_real_pdf() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cards = cards(5, "Friday Night");
    let mut last = None;

    let report = export_cards_to_pdf(
        &cards,
        &config(),
        CardStyle::Classic,
        dir.path(),
        &mut |p: &Progress| last = Some(p.percent),
        CancelToken::new(),
    )
    .expect("export");

    assert_eq!(report.placed, 5);
    assert_eq!(report.pages, 2);
    assert_eq!(last, Some(100));
    let path = report.artifact.path.expect("saved to disk");
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some("Friday Night_bingo_cards_5tarjetas.pdf")
    );
    let bytes = fs::read(&path).expect("read pdf");
    assert!(bytes.starts_with(b"%PDF"));
}
