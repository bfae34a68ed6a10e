//! Transcript document codec.
//!
//! The on-disk format is a `transcript` root with repeated `row` elements;
//! each row carries `words`, `not-pronounced-properly`, `sound-quality`,
//! `asr-quality`, `audio-filename` and `tag` children, with an `isEdited`
//! attribute on the three editable text elements. Decoding is best-effort:
//! unknown elements are ignored, out-of-range scores are clamped, and a
//! malformed row is skipped with a warning rather than failing the whole
//! document.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{LekhaError, Result};
use crate::row::{normalize_whitespace, Row, TextColumn, SOUND_QUALITY_MAX, SOUND_QUALITY_MIN};
use crate::wordcount::WordCounts;

/// Result of decoding a transcript document.
#[derive(Debug, Default)]
pub struct DecodedTranscript {
    /// Decoded rows in document order.
    pub rows: Vec<Row>,
    /// Word totals accumulated during the import (edited counters zero).
    pub totals: WordCounts,
    /// Non-fatal problems encountered while decoding.
    pub warnings: Vec<String>,
}

/// Decode a transcript document.
///
/// Returns an error only when nothing could be decoded at all; otherwise
/// problems are reported through [`DecodedTranscript::warnings`] and the
/// successfully decoded rows are kept.
pub fn decode_transcript(xml: &str) -> Result<DecodedTranscript> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut decoded = DecodedTranscript::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"row" => {
                match decode_row(&mut reader) {
                    Ok(row) => {
                        accumulate_totals(&mut decoded.totals, &row);
                        decoded.rows.push(row);
                    }
                    Err(err) => {
                        // Field-level problems are recovered inside
                        // decode_row; an error here means the row framing
                        // itself is broken and the reader position is no
                        // longer trustworthy.
                        log::warn!("transcript parse stopped inside a row: {err}");
                        decoded
                            .warnings
                            .push(format!("parse stopped inside a row: {err}"));
                        break;
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                // The reader cannot resynchronize after a framing error;
                // keep what was decoded so far.
                log::warn!("transcript parse stopped: {err}");
                decoded
                    .warnings
                    .push(format!("parse stopped before end of document: {err}"));
                break;
            }
        }
    }

    if decoded.rows.is_empty() && !decoded.warnings.is_empty() {
        return Err(LekhaError::MalformedTranscript(
            decoded.warnings.join("; "),
        ));
    }
    Ok(decoded)
}

/// Decode the children of one `row` element. The reader is positioned just
/// after the row start tag and is left just after its end tag.
fn decode_row(reader: &mut Reader<&[u8]>) -> Result<Row> {
    let mut row = Row::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();
                let edited = is_edited_attr(&e);
                let text = read_element_text(reader, &name)?;
                apply_field(&mut row, &name, &text, edited);
            }
            Event::Empty(e) => {
                let name = e.name().as_ref().to_vec();
                let edited = is_edited_attr(&e);
                apply_field(&mut row, &name, "", edited);
            }
            Event::End(e) if e.name().as_ref() == b"row" => return Ok(row),
            Event::Eof => {
                return Err(LekhaError::MalformedTranscript(
                    "unexpected end of document inside a row".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Read the text content of the current element up to its end tag.
fn read_element_text(reader: &mut Reader<&[u8]>, name: &[u8]) -> Result<String> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::CData(t) => text.push_str(&String::from_utf8_lossy(&t.into_inner())),
            Event::End(e) if e.name().as_ref() == name => return Ok(text),
            Event::Eof => {
                return Err(LekhaError::MalformedTranscript(format!(
                    "unexpected end of document inside '{}'",
                    String::from_utf8_lossy(name)
                )));
            }
            _ => {}
        }
    }
}

fn is_edited_attr(element: &BytesStart<'_>) -> bool {
    match element.try_get_attribute("isEdited") {
        Ok(Some(attr)) => attr
            .unescape_value()
            .map(|value| value == "true")
            .unwrap_or(false),
        Ok(None) => false,
        Err(err) => {
            log::warn!("unreadable isEdited attribute treated as false: {err}");
            false
        }
    }
}

fn apply_field(row: &mut Row, name: &[u8], raw_text: &str, edited: bool) {
    let text = normalize_whitespace(raw_text);
    match name {
        b"words" => {
            row.transcript = text;
            row.transcript_edited = edited;
        }
        b"not-pronounced-properly" => {
            row.mispronounced = text;
            row.mispronounced_edited = edited;
        }
        b"sound-quality" => {
            row.sound_quality = text
                .parse::<i64>()
                .unwrap_or(0)
                .clamp(SOUND_QUALITY_MIN, SOUND_QUALITY_MAX) as u8;
        }
        b"asr-quality" => {
            row.asr_quality = text.parse::<i64>().unwrap_or(0).clamp(0, 1) as u8;
        }
        b"audio-filename" => row.audio_file = text,
        b"tag" => {
            row.tags = text;
            row.tags_edited = edited;
        }
        _ => {
            log::debug!(
                "ignoring unknown transcript element '{}'",
                String::from_utf8_lossy(name)
            );
        }
    }
}

fn accumulate_totals(totals: &mut WordCounts, row: &Row) {
    totals.add_total(
        TextColumn::Transcript,
        row.transcript.split_whitespace().count() as u64,
    );
    totals.add_total(
        TextColumn::Mispronounced,
        row.mispronounced.split_whitespace().count() as u64,
    );
    totals.add_total(
        TextColumn::Tags,
        row.tags.split(';').filter(|t| !t.is_empty()).count() as u64,
    );
}

/// Encode rows as a transcript document, mirroring the decode structure,
/// with the current field values and edited flags.
pub fn encode_transcript(rows: &[Row]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("transcript")))?;

    for row in rows {
        writer.write_event(Event::Start(BytesStart::new("row")))?;

        write_flagged_text(&mut writer, "words", &row.transcript, row.transcript_edited)?;
        write_flagged_text(
            &mut writer,
            "not-pronounced-properly",
            &row.mispronounced,
            row.mispronounced_edited,
        )?;
        write_text_element(&mut writer, "sound-quality", &row.sound_quality.to_string())?;
        write_text_element(&mut writer, "asr-quality", &row.asr_quality.to_string())?;
        write_text_element(&mut writer, "audio-filename", &row.audio_file)?;
        write_flagged_text(&mut writer, "tag", &row.tags, row.tags_edited)?;

        writer.write_event(Event::End(BytesEnd::new("row")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("transcript")))?;
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn write_flagged_text(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
    edited: bool,
) -> Result<()> {
    let mut start = BytesStart::new(name);
    start.push_attribute(("isEdited", if edited { "true" } else { "false" }));
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
