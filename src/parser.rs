use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::track::{ParsedTrack, TrackGeometry, TrackPoint};

type Result<T> = std::result::Result<T, ParseError>;

/// Track content of a GPX document, segments still separate.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackDocument {
    pub name: Option<String>,
    pub description: Option<String>,
    pub geometry: TrackGeometry,
}

impl TrackDocument {
    /// Flatten every segment into a single ordered path.
    pub fn into_track(self) -> Result<ParsedTrack> {
        ParsedTrack::new(self.name, self.description, self.geometry.flatten())
    }
}

/// Parse GPX text into one flattened track.
pub fn extract(xml: &str) -> Result<ParsedTrack> {
    extract_document(xml)?.into_track()
}

/// Parse GPX text, keeping the segment structure of all `<trk>` elements.
pub fn extract_document(xml: &str) -> Result<TrackDocument> {
    let mut reader = Reader::from_str(xml);
    let mut saw_root = false;
    let mut root_closed = false;
    let mut open = Vec::<Vec<u8>>::new();
    let mut name: Option<String> = None;
    let mut description: Option<String> = None;
    let mut segments: Vec<Vec<TrackPoint>> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(_) | Event::Empty(_) | Event::CData(_) | Event::GeneralRef(_))
                if root_closed =>
            {
                return Err(content_after_root());
            }
            Ok(Event::Text(e)) if root_closed && !e.iter().all(u8::is_ascii_whitespace) => {
                return Err(content_after_root());
            }
            Ok(Event::Start(e)) => {
                match e.local_name().as_ref() {
                    b"trkseg" => segments.push(parse_segment(&mut reader)?),
                    b"name" if name.is_none() => {
                        name = non_empty(read_text_owned(&mut reader, &e)?);
                    }
                    b"desc" if description.is_none() => {
                        description = non_empty(read_text_owned(&mut reader, &e)?);
                    }
                    b"extensions" => skip_element(&mut reader, &e)?,
                    local => {
                        if local == b"gpx" {
                            saw_root = true;
                        }
                        open.push(local.to_vec());
                    }
                }
                root_closed = open.is_empty();
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"gpx" {
                    saw_root = true;
                }
                root_closed = open.is_empty();
            }
            Ok(Event::End(_)) => {
                open.pop();
                root_closed = open.is_empty();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(&reader, e)),
            _ => {}
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(ParseError::MalformedXml(format!(
            "document ends inside <{}>",
            String::from_utf8_lossy(unclosed)
        )));
    }
    if !saw_root {
        return Err(ParseError::MalformedXml(
            "no <gpx> root element found".to_string(),
        ));
    }

    let geometry = TrackGeometry::from_segments(segments).ok_or_else(|| {
        ParseError::EmptyTrack("document contains no valid <trkpt> elements".to_string())
    })?;

    debug!(
        points = geometry.point_count(),
        segments = geometry.segment_count(),
        "extracted GPX track"
    );

    Ok(TrackDocument {
        name,
        description,
        geometry,
    })
}

fn xml_error(reader: &Reader<&[u8]>, e: quick_xml::Error) -> ParseError {
    ParseError::MalformedXml(format!("{e} (at byte {})", reader.error_position()))
}

fn content_after_root() -> ParseError {
    ParseError::MalformedXml("content after root element".to_string())
}

fn unexpected_eof(element: &str) -> ParseError {
    ParseError::MalformedXml(format!("document ends inside <{element}>"))
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn is_valid_coordinate(lat: f64, lon: f64) -> bool {
    lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon)
}

/// Read lat/lon attributes from a `<trkpt>` start tag.
/// Missing, unparsable or out-of-range values yield `None` so the point is dropped.
fn parse_lat_lon(e: &BytesStart<'_>) -> Result<Option<(f64, f64)>> {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|err| {
            ParseError::MalformedXml(format!("invalid attribute on <trkpt>: {err}"))
        })?;
        let val = std::str::from_utf8(&attr.value).unwrap_or_default().trim();
        match attr.key.local_name().as_ref() {
            b"lat" => lat = val.parse::<f64>().ok(),
            b"lon" => lon = val.parse::<f64>().ok(),
            _ => {}
        }
    }

    match (lat, lon) {
        (Some(lat), Some(lon)) if is_valid_coordinate(lat, lon) => Ok(Some((lat, lon))),
        _ => {
            warn!(?lat, ?lon, "skipping track point with missing or invalid coordinates");
            Ok(None)
        }
    }
}

/// Accept RFC 3339; an offset-less timestamp is read as UTC.
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn parse_elevation(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|ele| ele.is_finite())
}

/// Parse a `<trkpt>` element and its children.
/// Called after receiving Event::Start for the point element.
fn parse_point<'a>(
    start: &BytesStart<'a>,
    reader: &mut Reader<&'a [u8]>,
) -> Result<Option<TrackPoint>> {
    let Some((lat, lon)) = parse_lat_lon(start)? else {
        skip_element(reader, start)?;
        return Ok(None);
    };

    let mut point = TrackPoint::new(lat, lon);
    let end_name = start.name().0.to_vec();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"ele" => point.elevation = parse_elevation(&read_text_owned(reader, &e)?),
                b"time" => point.timestamp = parse_timestamp(&read_text_owned(reader, &e)?),
                // name, sym, extensions and anything vendor-specific
                _ => skip_element(reader, &e)?,
            },
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => return Err(unexpected_eof("trkpt")),
            Err(e) => return Err(xml_error(reader, e)),
            _ => {}
        }
    }

    Ok(Some(point))
}

/// Parse a `<trkseg>` element.
fn parse_segment<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Vec<TrackPoint>> {
    let mut points = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"trkpt" => {
                    if let Some(pt) = parse_point(&e, reader)? {
                        points.push(pt);
                    }
                }
                _ => skip_element(reader, &e)?,
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"trkpt" {
                    if let Some((lat, lon)) = parse_lat_lon(&e)? {
                        points.push(TrackPoint::new(lat, lon));
                    }
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trkseg" => break,
            Ok(Event::Eof) => return Err(unexpected_eof("trkseg")),
            Err(e) => return Err(xml_error(reader, e)),
            _ => {}
        }
    }

    Ok(points)
}

fn skip_element(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<()> {
    reader
        .read_to_end(start.name())
        .map(|_| ())
        .map_err(|e| xml_error(reader, e))
}

/// Read text content of an element as an owned String.
/// Handles regular text, CDATA sections, and entity references (Event::GeneralRef).
/// Running out of input before the closing tag is a truncated document, not empty text.
fn read_text_owned<'a>(reader: &mut Reader<&'a [u8]>, start: &BytesStart<'_>) -> Result<String> {
    let end_name = start.name().0.to_vec();
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                let raw = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                text.push_str(raw);
            }
            Ok(Event::CData(e)) => {
                let s = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                text.push_str(s);
            }
            Ok(Event::GeneralRef(e)) => {
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    text.push(ch);
                } else {
                    let name = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                    match name {
                        "amp" => text.push('&'),
                        "lt" => text.push('<'),
                        "gt" => text.push('>'),
                        "quot" => text.push('"'),
                        "apos" => text.push('\''),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => {
                return Err(unexpected_eof(&String::from_utf8_lossy(&end_name)));
            }
            Err(e) => return Err(xml_error(reader, e)),
            _ => {}
        }
    }

    Ok(text)
}
