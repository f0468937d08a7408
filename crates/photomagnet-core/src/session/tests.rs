use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;

use super::*;
use crate::catalog::{default_catalog, find_product};
use crate::decode::FilterType;
use crate::encode::EncodeError;

fn config() -> PipelineConfig {
    PipelineConfig {
        resize_filter: FilterType::Bilinear,
        ..PipelineConfig::default()
    }
}

fn png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn file(name: &str, rgb: [u8; 3]) -> UploadFile {
    UploadFile::new(name, "image/png", png(120, 80, rgb))
}

fn files(n: usize) -> Vec<UploadFile> {
    (0..n)
        .map(|i| file(&format!("photo-{}.png", i), [(i * 40) as u8, 100, 200]))
        .collect()
}

fn session(max_images: usize) -> UploadSession {
    UploadSession::new(max_images, RenderTarget::new(50, 50, 2), config())
}

/// Single confirmed image with a small minimum crop box.
fn recrop_session() -> UploadSession {
    let mut s = UploadSession::new(
        1,
        RenderTarget::new(50, 50, 2),
        PipelineConfig {
            min_crop_size: 10,
            ..config()
        },
    );
    s.upload_batch(files(1)).unwrap();
    s.confirm_crop().unwrap();
    s
}

/// Upload `n` files and confirm every crop.
fn populated_session(max_images: usize, n: usize) -> UploadSession {
    let mut s = session(max_images);
    s.upload_batch(files(n)).unwrap();
    while s.is_cropping() {
        s.confirm_crop().unwrap();
    }
    s
}

fn pending_name(s: &UploadSession, index: usize) -> Option<String> {
    match s.slot(index)? {
        ImageSlot::PendingCrop(p) => Some(p.file_name.clone()),
        _ => None,
    }
}

fn recorder(s: &mut UploadSession) -> Rc<RefCell<Vec<Vec<String>>>> {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&calls);
    s.set_observer(move |images: &[String]| sink.borrow_mut().push(images.to_vec()));
    calls
}

#[test]
fn test_new_session_is_empty() {
    let s = session(3);
    assert_eq!(s.max_images(), 3);
    assert!(s.slots().iter().all(ImageSlot::is_empty));
    assert_eq!(s.remaining_capacity(), 3);
    assert!(!s.is_cropping());
    assert!(!s.is_complete());
}

#[test]
fn test_upload_places_pending_in_order() {
    let mut s = session(3);
    let report = s.upload_batch(files(2)).unwrap();

    assert_eq!(report.placed, vec![0, 1]);
    assert!(report.failed.is_empty());
    assert_eq!(pending_name(&s, 0).as_deref(), Some("photo-0.png"));
    assert_eq!(pending_name(&s, 1).as_deref(), Some("photo-1.png"));
    assert!(s.slot(2).unwrap().is_empty());
    assert_eq!(s.current_crop_index(), Some(0));
}

#[test]
fn test_excess_uploads_are_truncated() {
    let mut s = session(3);
    let report = s.upload_batch(files(5)).unwrap();
    assert_eq!(report.truncated, 2);
    assert_eq!(report.placed.len(), 3);
    assert_eq!(s.pending_count(), 3);
    assert_eq!(s.remaining_capacity(), 0);
}

#[test]
fn test_truncation_happens_before_filtering() {
    let mut s = session(2);
    let mut selection = vec![UploadFile::new("notes.txt", "text/plain", vec![1, 2, 3])];
    selection.extend(files(3));

    let report = s.upload_batch(selection).unwrap();
    assert_eq!(report.truncated, 2);
    assert_eq!(report.placed, vec![0]);
    assert!(matches!(report.rejected[..], [UploadError::NotAnImage { .. }]));
}

#[test]
fn test_oversized_files_rejected() {
    let mut s = UploadSession::new(
        3,
        RenderTarget::new(50, 50, 2),
        PipelineConfig {
            max_file_bytes: 10,
            ..config()
        },
    );
    let report = s.upload_batch(files(2)).unwrap();
    assert!(report.placed.is_empty());
    assert_eq!(report.rejected.len(), 2);
    assert!(report
        .rejected
        .iter()
        .all(|e| matches!(e, UploadError::FileTooLarge { .. })));
    assert!(!s.is_cropping());
}

#[test]
fn test_failed_decodes_take_no_slot() {
    let mut s = session(3);
    let selection = vec![
        UploadFile::new("broken.png", "image/png", vec![0, 1, 2, 3]),
        file("good.png", [1, 2, 3]),
    ];
    let report = s.upload_batch(selection).unwrap();

    assert_eq!(report.placed, vec![0]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].file_name, "broken.png");
    assert_eq!(pending_name(&s, 0).as_deref(), Some("good.png"));
    assert_eq!(s.pending_count(), 1);
}

#[test]
fn test_out_of_order_completion_keeps_submission_order() {
    let mut s = session(3);
    let plan = s.begin_batch(files(3)).unwrap();
    assert_eq!(s.remaining_capacity(), 0);

    let mut outcomes: Vec<DecodeOutcome> = plan.jobs.into_iter().map(DecodeJob::run).collect();
    outcomes.reverse();

    let mut report = None;
    for outcome in outcomes {
        assert!(report.is_none(), "report before batch finished");
        report = s.complete_decode(outcome).unwrap();
    }

    assert_eq!(report.unwrap().placed, vec![0, 1, 2]);
    for i in 0..3 {
        assert_eq!(pending_name(&s, i), Some(format!("photo-{}.png", i)));
    }
}

#[test]
fn test_second_batch_waits_for_first() {
    let mut s = session(3);
    let _plan = s.begin_batch(files(1)).unwrap();
    assert_eq!(s.begin_batch(files(1)).unwrap_err(), SessionError::BatchInProgress);
}

#[test]
fn test_no_capacity() {
    let mut s = populated_session(1, 1);
    assert_eq!(
        s.upload_batch(files(1)).unwrap_err(),
        SessionError::Upload(UploadError::NoCapacity)
    );
}

#[test]
fn test_duplicate_outcome_ignored() {
    let mut s = session(2);
    let mut plan = s.begin_batch(files(2)).unwrap();
    let second = plan.jobs.pop().unwrap();
    let first = plan.jobs.pop().unwrap();

    let ticket = first.ticket();
    assert_eq!(s.complete_decode(first.run()).unwrap(), None);

    let duplicate = DecodeOutcome {
        ticket,
        file_name: "again.png".into(),
        result: Err(DecodeError::InvalidFormat),
    };
    assert_eq!(s.complete_decode(duplicate).unwrap(), None);

    let report = s.complete_decode(second.run()).unwrap().unwrap();
    assert_eq!(report.placed, vec![0, 1]);
    assert!(report.failed.is_empty());
}

#[test]
fn test_confirm_crop_auto_advances_and_exits() {
    let mut s = session(3);
    s.upload_batch(files(3)).unwrap();

    assert_eq!(s.confirm_crop().unwrap(), 0);
    assert_eq!(s.current_crop_index(), Some(1));
    assert_eq!(s.confirm_crop().unwrap(), 1);
    assert_eq!(s.confirm_crop().unwrap(), 2);
    assert!(!s.is_cropping());
    assert!(s.is_complete());
    assert_eq!(s.confirm_crop().unwrap_err(), SessionError::NotInCropMode);
}

#[test]
fn test_removing_current_crop_resumes_at_shifted_slot() {
    let mut s = session(3);
    s.upload_batch(files(3)).unwrap();
    s.remove(0).unwrap();
    // photo-1 and photo-2 shifted down, crop resumes at the new slot 0
    assert_eq!(s.current_crop_index(), Some(0));
    assert_eq!(pending_name(&s, 0).as_deref(), Some("photo-1.png"));

    s.confirm_crop().unwrap();
    assert_eq!(s.current_crop_index(), Some(1));
}

#[test]
fn test_render_meets_oversampled_target() {
    let s = populated_session(3, 3);
    for slot in s.slots() {
        let populated = slot.as_populated().unwrap();
        assert!(populated.rendered.width >= 100);
        assert!(populated.rendered.height >= 100);
        assert_eq!(populated.rendered.mime, "image/jpeg");
    }
}

#[test]
fn test_crop_region_is_constrained() {
    let mut s = session(1);
    s.upload_batch(files(1)).unwrap();
    let region = s.set_crop_region(CropRegion::new(500, 500, 10, 10)).unwrap();
    // Sources cover 50x50 already, so the 120x80 upload is untouched
    assert_eq!((region.width, region.height), (80, 80));
    assert!(region.fits_within(120, 80));
}

#[test]
fn test_observer_sees_populated_images() {
    let mut s = session(2);
    let calls = recorder(&mut s);
    s.upload_batch(files(2)).unwrap();
    assert!(calls.borrow().is_empty());

    s.confirm_crop().unwrap();
    s.confirm_crop().unwrap();

    let calls = calls.borrow();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].len(), 1);
    assert_eq!(calls[1], s.populated_images());
    assert!(calls[1].iter().all(|u| u.starts_with("data:image/jpeg;base64,")));
}

#[test]
fn test_remove_compacts_and_preserves_order() {
    let mut s = populated_session(3, 3);
    let before = s.populated_images();
    let calls = recorder(&mut s);

    s.remove(1).unwrap();

    let after = s.populated_images();
    assert_eq!(after, vec![before[0].clone(), before[2].clone()]);
    assert!(s.slot(2).unwrap().is_empty());
    assert_eq!(s.remaining_capacity(), 1);
    assert_eq!(calls.borrow().last(), Some(&after));
}

#[test]
fn test_remove_errors() {
    let mut s = populated_session(3, 1);
    assert_eq!(s.remove(2).unwrap_err(), SessionError::SlotEmpty(2));
    assert_eq!(
        s.remove(9).unwrap_err(),
        SessionError::SlotOutOfRange { index: 9, len: 3 }
    );
}

#[test]
fn test_slot_ids_survive_compaction() {
    let mut s = populated_session(3, 3);
    let id = s.slot(2).unwrap().id();
    s.remove(0).unwrap();
    assert_eq!(s.slot(1).unwrap().id(), id);
}

#[test]
fn test_rotate_four_times_returns_to_start() {
    let mut s = populated_session(1, 1);
    let original = s.populated_images();
    let mut rotation = Rotation::Deg0;
    for _ in 0..4 {
        rotation = s.rotate(0).unwrap();
    }
    assert_eq!(rotation, Rotation::Deg0);
    assert_eq!(s.populated_images(), original);
}

#[test]
fn test_edit_replaces_rendering_in_place() {
    let mut s = populated_session(2, 2);
    let before = s.populated_images();
    let adj = Adjustments {
        sepia: 100.0,
        ..Default::default()
    };
    s.apply_edit(0, Rotation::Deg0, adj).unwrap();

    let after = s.populated_images();
    assert_ne!(after[0], before[0]);
    assert_eq!(after[1], before[1]);
    assert_eq!(s.slot(0).unwrap().as_populated().unwrap().adjustments, adj);
}

#[test]
fn test_edits_render_from_unfiltered_bitmap() {
    let mut s = populated_session(1, 1);
    let original = s.populated_images();

    s.set_adjustment(0, AdjustmentChannel::Brightness, 10.0).unwrap();
    s.set_adjustment(0, AdjustmentChannel::Brightness, 100.0).unwrap();

    assert_eq!(s.populated_images(), original);
}

#[test]
fn test_reset_adjustments_keeps_rotation() {
    let mut s = populated_session(1, 1);
    s.rotate(0).unwrap();
    s.set_adjustment(0, AdjustmentChannel::Contrast, 150.0).unwrap();
    s.reset_adjustments(0).unwrap();

    let slot = s.slot(0).unwrap().as_populated().unwrap();
    assert!(slot.adjustments.is_default());
    assert_eq!(slot.rotation, Rotation::Deg90);
}

#[test]
fn test_stale_render_is_dropped() {
    let mut s = populated_session(1, 1);
    let older = s
        .edit(0, Rotation::Deg180, Adjustments::default())
        .unwrap();
    let newer = s
        .edit(0, Rotation::Deg90, Adjustments::default())
        .unwrap();

    let newer_outcome = newer.run();
    let older_outcome = older.run();

    assert!(s.complete_render(newer_outcome).unwrap());
    assert!(!s.complete_render(older_outcome).unwrap());
    assert_eq!(
        s.slot(0).unwrap().as_populated().unwrap().rotation,
        Rotation::Deg90
    );
}

#[test]
fn test_failed_render_leaves_slot_untouched() {
    let mut s = populated_session(1, 1);
    let before = s.populated_images();
    let job = s.edit(0, Rotation::Deg90, Adjustments::default()).unwrap();

    let outcome = RenderOutcome {
        slot_id: job.slot_id(),
        generation: job.generation(),
        rotation: Rotation::Deg90,
        adjustments: Adjustments::default(),
        result: Err(RenderError::Encode(EncodeError::EncodingFailed("boom".into()))),
    };
    assert!(matches!(
        s.complete_render(outcome),
        Err(SessionError::Render(RenderError::Encode(_)))
    ));
    assert_eq!(s.populated_images(), before);
    assert_eq!(
        s.slot(0).unwrap().as_populated().unwrap().rotation,
        Rotation::Deg0
    );
}

#[test]
fn test_render_for_removed_slot_is_dropped() {
    let mut s = populated_session(2, 2);
    let job = s.edit(0, Rotation::Deg90, Adjustments::default()).unwrap();
    s.remove(0).unwrap();
    assert!(!s.complete_render(job.run()).unwrap());
}

#[test]
fn test_edit_requires_populated_slot() {
    let mut s = session(2);
    assert_eq!(
        s.edit(0, Rotation::Deg0, Adjustments::default()).unwrap_err(),
        SessionError::SlotNotPopulated(0)
    );
}

#[test]
fn test_recrop_from_source() {
    let mut s = recrop_session();
    let before = s.slot(0).unwrap().as_populated().unwrap().crop;
    assert_eq!(before, CropRegion::new(20, 0, 80, 80));

    let region = s.recrop(0, CropRegion::new(0, 0, 60, 60)).unwrap();
    assert_eq!(region, CropRegion::new(0, 0, 60, 60));

    let slot = s.slot(0).unwrap().as_populated().unwrap();
    assert_eq!(slot.crop, region);
    assert_eq!((slot.cropped.width, slot.cropped.height), (100, 100));
}

#[test]
fn test_recrop_selector_starts_at_current_crop() {
    let mut s = recrop_session();
    s.recrop(0, CropRegion::new(40, 10, 60, 60)).unwrap();
    let selector = s.recrop_selector(0).unwrap();
    assert_eq!(selector.region(), CropRegion::new(40, 10, 60, 60));
}

#[test]
fn test_cancel_crop_discards_pending() {
    let mut s = populated_session(3, 1);
    s.upload_batch(files(2)).unwrap();
    assert_eq!(s.pending_count(), 2);

    s.cancel_crop();
    assert_eq!(s.pending_count(), 0);
    assert_eq!(s.populated_count(), 1);
    assert!(!s.is_cropping());
    assert_eq!(s.remaining_capacity(), 2);
}

#[test]
fn test_close_drops_late_results() {
    let mut s = session(2);
    let plan = s.begin_batch(files(1)).unwrap();
    s.close();

    let outcome = plan.jobs.into_iter().next().unwrap().run();
    assert!(matches!(outcome.result, Err(DecodeError::Cancelled)));
    assert_eq!(s.complete_decode(outcome).unwrap(), None);
    assert!(s.slots().iter().all(ImageSlot::is_empty));
    assert_eq!(s.upload_batch(files(1)).unwrap_err(), SessionError::Closed);
}

#[test]
fn test_drop_cancels_jobs() {
    let mut s = populated_session(1, 1);
    let job = s.edit(0, Rotation::Deg90, Adjustments::default()).unwrap();
    drop(s);
    assert_eq!(job.run().result, Err(RenderError::Cancelled));
}

#[test]
fn test_load_existing_round_trips() {
    let images = populated_session(3, 2).populated_images();

    let mut s = session(3);
    let calls = recorder(&mut s);
    s.load_existing(&images).unwrap();

    assert_eq!(s.populated_images(), images);
    assert_eq!(s.populated_count(), 2);
    assert_eq!(s.remaining_capacity(), 1);
    assert_eq!(calls.borrow().as_slice(), &[images.clone()]);

    // Existing images can be edited and removed like fresh ones
    s.rotate(1).unwrap();
    s.remove(0).unwrap();
    assert_eq!(s.populated_count(), 1);
}

#[test]
fn test_load_existing_errors() {
    let mut s = session(1);
    let images = vec!["data:image/png;base64,AAAA".to_string(); 2];
    assert_eq!(
        s.load_existing(&images).unwrap_err(),
        SessionError::TooManyImages { given: 2, max: 1 }
    );
    assert!(matches!(
        s.load_existing(&["not a url".to_string()]),
        Err(SessionError::Decode(DecodeError::InvalidDataUrl(_)))
    ));
}

#[test]
fn test_with_existing_for_catalog_product() {
    let catalog = default_catalog("2024-01-01T00:00:00.000Z");
    let product = find_product(&catalog, "set-of-3").unwrap();
    let images = populated_session(3, 3).populated_images();

    let s = UploadSession::with_existing(product, config(), &images).unwrap();
    assert!(s.is_complete());
    assert_eq!(s.populated_images(), images);
}

#[test]
fn test_product_target_uses_repaired_config() {
    let catalog = default_catalog("2024-01-01T00:00:00.000Z");
    let product = find_product(&catalog, "set-of-3").unwrap();
    let expected = *UploadSession::for_product(product, config()).target();

    for pixels_per_mm in [0.0, -2.5, f64::NAN] {
        let s = UploadSession::for_product(
            product,
            PipelineConfig {
                pixels_per_mm,
                ..config()
            },
        );
        assert_eq!(s.config().pixels_per_mm, 1.0);
        assert_eq!(*s.target(), expected);
        assert_eq!((s.target().pixel_width(), s.target().pixel_height()), (100, 100));
    }
}

#[test]
fn test_puzzle_single_confirmation_completes() {
    let catalog = default_catalog("2024-01-01T00:00:00.000Z");
    let puzzle = find_product(&catalog, "puzzle").unwrap();
    let mut s = UploadSession::for_product(puzzle, config());
    assert_eq!(s.max_images(), 1);

    s.upload_batch(files(1)).unwrap();
    s.confirm_crop().unwrap();
    assert!(s.is_complete());

    let rendered = &s.slot(0).unwrap().as_populated().unwrap().rendered;
    assert!(rendered.width >= 300 && rendered.height >= 300);
}
