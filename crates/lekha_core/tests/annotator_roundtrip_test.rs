//! Integration tests for the open/edit/save/reopen cycle on disk.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use lekha_core::annotator::Annotator;
use lekha_core::events::StoreEvent;
use lekha_core::row::{CellValue, Column, TextColumn};
use lekha_core::wordcount::WordCounts;

const TRANSCRIPT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<transcript>
    <row>
        <words isEdited="false">the quick fox</words>
        <not-pronounced-properly isEdited="false">fox</not-pronounced-properly>
        <sound-quality>4</sound-quality>
        <asr-quality>1</asr-quality>
        <audio-filename>clip_001.wav</audio-filename>
        <tag isEdited="false">noise</tag>
    </row>
    <row>
        <words isEdited="true">already touched</words>
        <not-pronounced-properly isEdited="false"></not-pronounced-properly>
        <sound-quality>2</sound-quality>
        <asr-quality>0</asr-quality>
        <audio-filename>clip_002.wav</audio-filename>
        <tag isEdited="false"></tag>
    </row>
</transcript>
"#;

fn write_transcript(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("batch.xml");
    fs::write(&path, TRANSCRIPT).unwrap();
    path
}

#[test]
fn open_edit_save_reopen_preserves_everything() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_transcript(dir.path());

    let mut annotator = Annotator::new();
    let summary = annotator.open(&path).unwrap();
    assert_eq!(summary.rows, 2);
    assert!(summary.warnings.is_empty());
    // No sidecar yet: totals from the import, edited counters zero
    assert_eq!(summary.counts.transcript_total, 5);
    assert_eq!(summary.counts.mispronounced_total, 1);
    assert_eq!(summary.counts.tagged_total, 1);
    assert_eq!(summary.counts.transcript_edited, 0);

    // The imported isEdited flag shows as a highlight without counting
    // toward the edited aggregates
    assert!(annotator.store().is_highlighted(1, TextColumn::Transcript));
    assert_eq!(annotator.store().word_counts().transcript_edited, 0);

    // Edit one cell and watch the delta on the aggregate channel
    let deltas = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&deltas);
    annotator.subscribe(Arc::new(move |event| {
        if let StoreEvent::EditedWordsDelta { column, delta } = event {
            sink.lock().unwrap().push((*column, *delta));
        }
    }));
    annotator.write(
        0,
        Column::Transcript,
        CellValue::Text("the quick brown fox".to_string()),
    );
    assert_eq!(
        *deltas.lock().unwrap(),
        vec![(TextColumn::Transcript, 1_i64)]
    );

    let saved = annotator.save().unwrap();
    assert_eq!(saved.counts.transcript_edited, 1);

    // The sidecar landed in the wordcount subdirectory
    let sidecar = dir.path().join("wordcount").join("batch_wordcount.xml");
    assert!(sidecar.exists());

    // Reopen: values, flags, and the cumulative counters all survive
    let mut reopened = Annotator::new();
    let summary = reopened.open(&path).unwrap();
    assert_eq!(summary.rows, 2);
    assert_eq!(summary.counts.transcript_edited, 1);
    // Totals resume from the sidecar as written at save time, not from a
    // recount of the edited text
    assert_eq!(summary.counts.transcript_total, 5);

    let rows = reopened.store().rows();
    assert_eq!(rows[0].transcript, "the quick brown fox");
    assert!(rows[0].transcript_edited);
    assert!(rows[1].transcript_edited);
    assert_eq!(rows[0].mispronounced, "fox");
    assert_eq!(rows[0].sound_quality, 4);
    assert_eq!(rows[1].audio_file, "clip_002.wav");

    // The re-imported text is the new baseline, so the cell reads as
    // unedited territory for fresh diffs
    assert!(reopened
        .store()
        .is_reverted(0, TextColumn::Transcript, "the quick brown fox"));
}

#[test]
fn missing_sidecar_resumes_with_zeroed_edited_counters() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_transcript(dir.path());

    let mut annotator = Annotator::new();
    annotator.open(&path).unwrap();
    annotator.write(0, Column::Tags, CellValue::Text("noise;music".to_string()));
    annotator.save().unwrap();

    // Remove the sidecar; the transcript itself is untouched
    fs::remove_file(WordCounts::sidecar_path(&path)).unwrap();

    let mut reopened = Annotator::new();
    let summary = reopened.open(&path).unwrap();
    assert_eq!(summary.counts.tagged_edited, 0);
    assert_eq!(summary.counts.tagged_total, 2);
}

#[test]
fn save_as_rebinds_the_annotator_to_the_new_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_transcript(dir.path());

    let mut annotator = Annotator::new();
    annotator.open(&path).unwrap();

    let copy = dir.path().join("copy.xml");
    annotator.save_as(&copy).unwrap();
    assert_eq!(annotator.path(), Some(copy.as_path()));
    assert!(copy.exists());
    assert!(dir
        .path()
        .join("wordcount")
        .join("copy_wordcount.xml")
        .exists());

    // Subsequent saves go to the new binding
    annotator.write(0, Column::SoundQuality, CellValue::Number(5));
    annotator.save().unwrap();
    let reread = fs::read_to_string(&copy).unwrap();
    assert!(reread.contains("<sound-quality>5</sound-quality>"));
}
