use mediagate_core::{IngestError, ResourceKey, ResourceState};
use mediagate_processing::{AudioTrack, ProbedMedia, VideoTrack};
use mediagate_services::pipelines::{
    CopyPipeline, Pipeline, PipelineOutcome, ScanCopyPipeline, SharedLiveMediaPipeline,
    ThumbnailPipeline, TimedTextPipeline, VideoPipeline,
};
use mediagate_services::test_helpers::*;
use mediagate_services::VideoSettings;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

fn key(object_key: &str) -> ResourceKey {
    ResourceKey::parse(object_key).unwrap()
}

const SRT_WITH_SCRIPT: &str =
    "1\n00:00:00,000 --> 00:00:01,000\n<script>alert(\"foo\")</script>\n";

#[tokio::test]
async fn copy_pipeline_writes_document_and_marks_ready() {
    let harness = TestHarness::new();
    let object_key = "d1/document/d1/1533686400";
    harness
        .storage
        .set_file(SOURCE_BUCKET, object_key, b"%PDF".to_vec());

    let pipeline = CopyPipeline::new(harness.context());
    let outcome = pipeline.run(&key(object_key), SOURCE_BUCKET).await.unwrap();

    assert_eq!(outcome, PipelineOutcome::terminal(ResourceState::Ready, None));
    assert_eq!(
        harness.storage.keys(DESTINATION_BUCKET),
        vec!["d1/document/1533686400".to_string()]
    );
    let last = harness.tracker.last().unwrap();
    assert_eq!(last.key, object_key);
    assert_eq!(last.state, ResourceState::Ready);
    assert_eq!(last.metadata, None);
}

#[tokio::test]
async fn copy_family_is_idempotent() {
    for (object_key, destination) in [
        ("d1/document/d1/1533686400", "d1/document/1533686400"),
        (
            "c1/classroomdocument/r1/1533686400",
            "c1/classroomdocument/r1/1533686400",
        ),
        (
            "m1/markdown-images/i1/1533686400.png",
            "m1/markdown-images/i1/1533686400.png",
        ),
    ] {
        let harness = TestHarness::new();
        harness
            .storage
            .set_file(SOURCE_BUCKET, object_key, b"content".to_vec());
        let pipeline = CopyPipeline::new(harness.context());

        for _ in 0..2 {
            let outcome = pipeline.run(&key(object_key), SOURCE_BUCKET).await.unwrap();
            assert_eq!(outcome, PipelineOutcome::terminal(ResourceState::Ready, None));
        }

        assert_eq!(
            harness.storage.keys(DESTINATION_BUCKET),
            vec![destination.to_string()]
        );
        assert_eq!(
            harness.storage.get_file(DESTINATION_BUCKET, destination),
            Some(b"content".to_vec())
        );
        assert_eq!(
            harness.tracker.states(),
            vec![ResourceState::Ready, ResourceState::Ready]
        );
    }
}

#[tokio::test]
async fn copy_failure_writes_no_state() {
    let harness = TestHarness::new();
    let pipeline = CopyPipeline::new(harness.context());

    let result = pipeline
        .run(&key("m1/markdown-images/i1/1533686400.png"), SOURCE_BUCKET)
        .await;

    assert!(matches!(result, Err(IngestError::Storage(_))));
    assert!(harness.tracker.updates().is_empty());
}

#[tokio::test]
async fn clean_deposit_is_copied_once_at_identical_key() {
    let harness = TestHarness::new();
    let object_key = "fd1/depositedfile/df1/1533686400.pdf";
    harness
        .storage
        .set_file(SOURCE_BUCKET, object_key, b"harmless".to_vec());

    let pipeline = ScanCopyPipeline::new(harness.context(), harness.scanner.clone());
    let outcome = pipeline.run(&key(object_key), SOURCE_BUCKET).await.unwrap();

    assert_eq!(
        harness.storage.keys(DESTINATION_BUCKET),
        vec![object_key.to_string()]
    );
    assert_eq!(
        harness.tracker.states(),
        vec![
            ResourceState::Scanning,
            ResourceState::Copying,
            ResourceState::Ready
        ]
    );
    assert_eq!(
        outcome.payload(),
        None,
        "deposited files return nothing to the caller"
    );
    let ready = harness.tracker.last().unwrap();
    assert_eq!(
        serde_json::to_value(ready.metadata).unwrap(),
        json!({ "extension": "pdf" })
    );

    // The staged copy is gone once the pipeline returns
    let scanned = harness.scanner.scanned();
    assert_eq!(scanned.len(), 1);
    assert_eq!(scanned[0].1, b"harmless".to_vec());
    assert!(!scanned[0].0.exists());
}

#[tokio::test]
async fn deposit_without_extension_has_no_ready_metadata() {
    let harness = TestHarness::new();
    let object_key = "fd1/depositedfile/df1/1533686400";
    harness
        .storage
        .set_file(SOURCE_BUCKET, object_key, b"harmless".to_vec());

    let pipeline = ScanCopyPipeline::new(harness.context(), harness.scanner.clone());
    pipeline.run(&key(object_key), SOURCE_BUCKET).await.unwrap();

    assert_eq!(harness.tracker.last().unwrap().metadata, None);
}

#[tokio::test]
async fn infected_deposit_is_never_copied() {
    let mut harness = TestHarness::new();
    harness.scanner = Arc::new(FakeScanner::infected(&["Win.Test.EICAR_HDB-1"]));
    let object_key = "fd1/depositedfile/df1/1533686400.txt";
    harness
        .storage
        .set_file(SOURCE_BUCKET, object_key, b"X5O!P%@AP".to_vec());

    let pipeline = ScanCopyPipeline::new(harness.context(), harness.scanner.clone());
    let outcome = pipeline.run(&key(object_key), SOURCE_BUCKET).await.unwrap();

    assert_eq!(outcome.state(), ResourceState::Infected);
    assert!(harness.storage.keys(DESTINATION_BUCKET).is_empty());
    assert_eq!(
        harness.tracker.states(),
        vec![ResourceState::Scanning, ResourceState::Infected]
    );
    assert_eq!(
        serde_json::to_value(harness.tracker.last().unwrap().metadata).unwrap(),
        json!({ "error": ["Win.Test.EICAR_HDB-1"] })
    );
    assert!(!harness.scanner.scanned()[0].0.exists());
}

#[tokio::test]
async fn scan_failure_records_error_then_propagates() {
    let mut harness = TestHarness::new();
    harness.scanner = Arc::new(FakeScanner::failing("clamd unavailable"));
    let object_key = "fd1/depositedfile/df1/1533686400.txt";
    harness
        .storage
        .set_file(SOURCE_BUCKET, object_key, b"data".to_vec());

    let pipeline = ScanCopyPipeline::new(harness.context(), harness.scanner.clone());
    let result = pipeline.run(&key(object_key), SOURCE_BUCKET).await;

    match result {
        Err(IngestError::Scan(message)) => assert_eq!(message, "clamd unavailable"),
        other => panic!("expected scan error, got {:?}", other),
    }
    assert!(harness.storage.keys(DESTINATION_BUCKET).is_empty());
    assert_eq!(
        harness.tracker.states(),
        vec![ResourceState::Scanning, ResourceState::Error]
    );
    assert_eq!(
        serde_json::to_value(harness.tracker.last().unwrap().metadata).unwrap(),
        json!({ "error": "clamd unavailable" })
    );
    assert!(!harness.scanner.scanned()[0].0.exists());
}

#[tokio::test]
async fn three_page_pdf_produces_three_svgs_and_a_copy() {
    let mut harness = TestHarness::new();
    harness.rasterizer = Arc::new(FakeRasterizer::with_pages(3));
    let object_key = "v1/sharedlivemedia/s1/1533686400.pdf";
    harness
        .storage
        .set_file(SOURCE_BUCKET, object_key, b"%PDF-1.4".to_vec());

    let pipeline = SharedLiveMediaPipeline::new(harness.context(), harness.rasterizer.clone());
    let outcome = pipeline.run(&key(object_key), SOURCE_BUCKET).await.unwrap();

    assert_eq!(
        outcome.payload(),
        Some(json!({ "nbPages": 3, "extension": "pdf" }))
    );
    assert_eq!(
        harness.storage.keys(DESTINATION_BUCKET),
        vec![
            "v1/sharedlivemedia/s1/1533686400.pdf".to_string(),
            "v1/sharedlivemedia/s1/1533686400_1.svg".to_string(),
            "v1/sharedlivemedia/s1/1533686400_2.svg".to_string(),
            "v1/sharedlivemedia/s1/1533686400_3.svg".to_string(),
        ]
    );
    assert_eq!(
        harness.tracker.states(),
        vec![ResourceState::Processing, ResourceState::Ready]
    );
    assert_eq!(
        serde_json::to_value(harness.tracker.last().unwrap().metadata).unwrap(),
        json!({ "nbPages": 3, "extension": "pdf" })
    );
}

#[tokio::test]
async fn page_fan_out_is_bounded() {
    let mut harness = TestHarness::new();
    let rasterizer =
        Arc::new(FakeRasterizer::with_pages(40).with_render_delay(Duration::from_millis(5)));
    harness.rasterizer = rasterizer.clone();
    let object_key = "v1/sharedlivemedia/s1/1533686400.pdf";
    harness
        .storage
        .set_file(SOURCE_BUCKET, object_key, b"%PDF-1.4".to_vec());

    let pipeline = SharedLiveMediaPipeline::new(harness.context(), harness.rasterizer.clone())
        .with_page_concurrency(4);
    let outcome = pipeline.run(&key(object_key), SOURCE_BUCKET).await.unwrap();

    assert_eq!(
        outcome.payload(),
        Some(json!({ "nbPages": 40, "extension": "pdf" }))
    );
    assert!(rasterizer.peak_concurrency() <= 4);
    assert!(rasterizer.peak_concurrency() > 1);
    assert_eq!(harness.storage.keys(DESTINATION_BUCKET).len(), 41);
}

#[tokio::test]
async fn failing_page_aborts_without_ready() {
    let mut harness = TestHarness::new();
    harness.rasterizer = Arc::new(FakeRasterizer::failing_on(3, 2));
    let object_key = "v1/sharedlivemedia/s1/1533686400.pdf";
    harness
        .storage
        .set_file(SOURCE_BUCKET, object_key, b"%PDF-1.4".to_vec());

    let pipeline = SharedLiveMediaPipeline::new(harness.context(), harness.rasterizer.clone());
    let result = pipeline.run(&key(object_key), SOURCE_BUCKET).await;

    assert!(matches!(result, Err(IngestError::Rasterize(_))));
    assert_eq!(harness.tracker.states(), vec![ResourceState::Processing]);
    assert!(!harness
        .storage
        .has_file(DESTINATION_BUCKET, "v1/sharedlivemedia/s1/1533686400.pdf"));
}

#[tokio::test]
async fn failing_page_upload_aborts_the_join() {
    let mut harness = TestHarness::new();
    harness.rasterizer = Arc::new(FakeRasterizer::with_pages(2));
    harness.storage.fail_uploads_containing("_2.svg");
    let object_key = "v1/sharedlivemedia/s1/1533686400.pdf";
    harness
        .storage
        .set_file(SOURCE_BUCKET, object_key, b"%PDF-1.4".to_vec());

    let pipeline = SharedLiveMediaPipeline::new(harness.context(), harness.rasterizer.clone());
    let result = pipeline.run(&key(object_key), SOURCE_BUCKET).await;

    assert!(matches!(result, Err(IngestError::Storage(_))));
    assert_eq!(harness.tracker.states(), vec![ResourceState::Processing]);
}

#[tokio::test]
async fn transcript_path_escapes_caption_text() {
    let harness = TestHarness::new();
    let object_key = "p1/timedtexttrack/t1/1569309880_fr_ts";
    harness
        .storage
        .set_file(SOURCE_BUCKET, object_key, SRT_WITH_SCRIPT.as_bytes().to_vec());

    let pipeline = TimedTextPipeline::new(harness.context());
    let outcome = pipeline.run(&key(object_key), SOURCE_BUCKET).await.unwrap();

    assert_eq!(outcome.state(), ResourceState::Ready);
    let vtt = harness
        .storage
        .get_file(DESTINATION_BUCKET, "p1/timedtext/1569309880_fr_ts.vtt")
        .unwrap();
    let vtt = String::from_utf8(vtt).unwrap();
    assert_eq!(
        vtt,
        "WEBVTT\n\n1\n00:00:00.000 --> 00:00:01.000\n&lt;script&gt;alert(&quot;foo&quot;)&lt;/script&gt;\n\n"
    );
    assert!(harness
        .storage
        .has_file(DESTINATION_BUCKET, "p1/timedtext/source/1569309880_fr_ts"));
    assert_eq!(
        serde_json::to_value(harness.tracker.last().unwrap().metadata).unwrap(),
        json!({ "extension": "srt" })
    );
}

#[tokio::test]
async fn subtitle_path_keeps_raw_text() {
    let harness = TestHarness::new();
    for object_key in [
        "p1/timedtexttrack/t1/1569309880_fr_st",
        "p1/timedtexttrack/t2/1569309880_en_cc",
    ] {
        harness
            .storage
            .set_file(SOURCE_BUCKET, object_key, SRT_WITH_SCRIPT.as_bytes().to_vec());

        let pipeline = TimedTextPipeline::new(harness.context());
        pipeline.run(&key(object_key), SOURCE_BUCKET).await.unwrap();

        let parsed = key(object_key);
        let vtt_key = format!("p1/timedtext/{}.vtt", parsed.stamp());
        let vtt = String::from_utf8(
            harness
                .storage
                .get_file(DESTINATION_BUCKET, &vtt_key)
                .unwrap(),
        )
        .unwrap();
        assert!(vtt.contains("<script>alert(\"foo\")</script>"));
    }
}

#[tokio::test]
async fn unparseable_captions_end_in_error_without_failing() {
    let harness = TestHarness::new();
    let object_key = "p1/timedtexttrack/t1/1569309880_fr_st";
    harness
        .storage
        .set_file(SOURCE_BUCKET, object_key, b"not captions at all".to_vec());

    let pipeline = TimedTextPipeline::new(harness.context());
    let outcome = pipeline.run(&key(object_key), SOURCE_BUCKET).await.unwrap();

    assert_eq!(outcome, PipelineOutcome::terminal(ResourceState::Error, None));
    assert_eq!(harness.tracker.states(), vec![ResourceState::Error]);
    assert!(harness.storage.keys(DESTINATION_BUCKET).is_empty());
}

#[tokio::test]
async fn overflowing_cue_timestamp_ends_in_error() {
    let harness = TestHarness::new();
    let object_key = "p1/timedtexttrack/t1/1569309880_fr_st";
    let captions = "1\n00:00:01,000 --> 00:00:02,000\nOne\n\n\
                    2\n9999999999999999:00:00,000 --> 9999999999999999:00:01,000\nTwo\n";
    harness
        .storage
        .set_file(SOURCE_BUCKET, object_key, captions.as_bytes().to_vec());

    let pipeline = TimedTextPipeline::new(harness.context());
    let outcome = pipeline.run(&key(object_key), SOURCE_BUCKET).await.unwrap();

    assert_eq!(outcome, PipelineOutcome::terminal(ResourceState::Error, None));
    assert_eq!(harness.tracker.states(), vec![ResourceState::Error]);
    assert!(harness.storage.keys(DESTINATION_BUCKET).is_empty());
}

#[tokio::test]
async fn missing_caption_source_propagates() {
    let harness = TestHarness::new();
    let pipeline = TimedTextPipeline::new(harness.context());

    let result = pipeline
        .run(&key("p1/timedtexttrack/t1/1569309880_fr"), SOURCE_BUCKET)
        .await;

    assert!(matches!(result, Err(IngestError::Storage(_))));
    assert!(harness.tracker.updates().is_empty());
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
    buffer.into_inner()
}

#[tokio::test]
async fn thumbnail_is_published_at_every_height() {
    let harness = TestHarness::new();
    let object_key = "p1/thumbnail/th1/1533686400";
    harness
        .storage
        .set_file(SOURCE_BUCKET, object_key, png(64, 36));

    let pipeline = ThumbnailPipeline::new(harness.context());
    let outcome = pipeline.run(&key(object_key), SOURCE_BUCKET).await.unwrap();

    assert_eq!(outcome.state(), ResourceState::Ready);
    assert_eq!(
        harness.storage.keys(DESTINATION_BUCKET),
        vec![
            "p1/thumbnails/1533686400_1080.jpg".to_string(),
            "p1/thumbnails/1533686400_144.jpg".to_string(),
            "p1/thumbnails/1533686400_240.jpg".to_string(),
            "p1/thumbnails/1533686400_480.jpg".to_string(),
            "p1/thumbnails/1533686400_720.jpg".to_string(),
        ]
    );
    assert_eq!(harness.tracker.states(), vec![ResourceState::Ready]);
}

#[tokio::test]
async fn undecodable_thumbnail_fails_without_state() {
    let harness = TestHarness::new();
    let object_key = "p1/thumbnail/th1/1533686400";
    harness
        .storage
        .set_file(SOURCE_BUCKET, object_key, b"not an image".to_vec());

    let pipeline = ThumbnailPipeline::new(harness.context());
    let result = pipeline.run(&key(object_key), SOURCE_BUCKET).await;

    assert!(matches!(result, Err(IngestError::Thumbnail(_))));
    assert!(harness.tracker.updates().is_empty());
}

#[tokio::test]
async fn video_job_follows_probed_source() {
    let mut harness = TestHarness::new();
    harness.probe = Arc::new(FakeProbe::new(Some(ProbedMedia {
        video: Some(VideoTrack {
            width: Some(1280),
            height: 720,
            frame_rate: Some(23.976),
        }),
        audio: Some(AudioTrack {
            bit_rate: Some(128_000),
        }),
    })));
    let object_key = "v1/video/v1/1533686400";
    harness
        .storage
        .set_file(SOURCE_BUCKET, object_key, b"mp4".to_vec());

    let pipeline = VideoPipeline::new(
        harness.context(),
        harness.probe.clone(),
        harness.transcoder.clone(),
        VideoSettings {
            queue: Some("arn:aws:mediaconvert:queue/default".to_string()),
            ..VideoSettings::default()
        },
    );
    let outcome = pipeline.run(&key(object_key), SOURCE_BUCKET).await.unwrap();

    assert_eq!(
        outcome.payload(),
        Some(json!({ "jobId": "1234567890123-abc123" }))
    );
    assert_eq!(harness.tracker.states(), vec![ResourceState::Processing]);
    assert_eq!(
        harness.probe.urls(),
        vec!["https://example.com/presigned/source/v1/video/v1/1533686400".to_string()]
    );

    let jobs = harness.transcoder.jobs();
    assert_eq!(jobs.len(), 1);
    let job = serde_json::to_value(&jobs[0]).unwrap();
    assert_eq!(job["input"], "s3://source/v1/video/v1/1533686400");
    assert_eq!(job["queue"], "arn:aws:mediaconvert:queue/default");
    assert_eq!(job["userMetadata"]["resourceKey"], object_key);
    assert_eq!(
        job["outputGroups"][0]["destination"],
        "s3://destination/v1/mp4/1533686400"
    );
    assert_eq!(job["outputGroups"][0]["outputs"].as_array().unwrap().len(), 4);
    assert_eq!(
        job["outputGroups"][0]["outputs"][0]["video"]["frameRate"],
        json!({ "numerator": 24000, "denominator": 1001 })
    );
    assert_eq!(
        job["outputGroups"][3]["destination"],
        "s3://destination/v1/previews/1533686400"
    );
}

#[tokio::test]
async fn probe_failure_propagates_before_submission() {
    let mut harness = TestHarness::new();
    harness.probe = Arc::new(FakeProbe::failing());
    let object_key = "v1/video/v1/1533686400";
    harness
        .storage
        .set_file(SOURCE_BUCKET, object_key, b"mp4".to_vec());

    let pipeline = VideoPipeline::new(
        harness.context(),
        harness.probe.clone(),
        harness.transcoder.clone(),
        VideoSettings::default(),
    );
    let result = pipeline.run(&key(object_key), SOURCE_BUCKET).await;

    assert!(matches!(result, Err(IngestError::Probe(_))));
    assert!(harness.transcoder.jobs().is_empty());
    assert!(harness.tracker.updates().is_empty());
}
