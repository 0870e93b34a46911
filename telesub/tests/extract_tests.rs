//! End-to-end extraction tests over synthetic transport streams.
//!
//! Streams are assembled in-test: teletext data units are built in decoded
//! bit order, bit-reversed into wire order, wrapped into Private Stream 1
//! PES packets and split across TS packets.

use telesub::{extract, ExtractOptions, TeletextExtractor};
use telesub_teletext::coding::{ham_8_4, with_odd_parity};

const TS_PACKET_SIZE: usize = 188;
const TELETEXT_PID: u16 = 0x0079;

// --- teletext data unit builders (decoded bit order) ---

fn unit(magazine: u8, row: u8, data: [u8; 40]) -> [u8; 44] {
    let address0 = (magazine & 0x07) | ((row & 0x01) << 3);
    let address1 = row >> 1;
    let mut raw = [0u8; 44];
    raw[2] = ham_8_4(address0);
    raw[3] = ham_8_4(address1);
    raw[4..].copy_from_slice(&data);
    raw
}

/// Y=0 header for the page: subtitle flag set, serial mode, charset 0.
fn header_unit(page: u16) -> [u8; 44] {
    let magazine = ((page >> 8) & 0x0F) as u8;
    let mut data = [with_odd_parity(b' '); 40];
    data[0] = ham_8_4((page & 0x0F) as u8);
    data[1] = ham_8_4(((page >> 4) & 0x0F) as u8);
    for slot in &mut data[2..5] {
        *slot = ham_8_4(0);
    }
    data[5] = ham_8_4(0x08); // subtitle flag
    data[6] = ham_8_4(0);
    data[7] = ham_8_4(0x01); // serial mode, charset 0
    unit(magazine, 0, data)
}

/// Boxed caption row with `text` starting at column 2.
fn row_unit(page: u16, row: u8, text: &str) -> [u8; 44] {
    let magazine = ((page >> 8) & 0x0F) as u8;
    let mut data = [with_odd_parity(b' '); 40];
    data[0] = with_odd_parity(0x0B);
    data[1] = with_odd_parity(0x0B);
    for (i, b) in text.bytes().enumerate().take(37) {
        data[2 + i] = with_odd_parity(b);
    }
    unit(magazine, row, data)
}

// --- PES and TS builders (wire order) ---

/// Private Stream 1 PES packet with optional PTS (milliseconds) carrying
/// the given data units.
fn teletext_pes(pts_ms: Option<u64>, units: &[[u8; 44]]) -> Vec<u8> {
    let mut field = vec![0x10u8]; // data_identifier: EBU data
    for unit in units {
        field.push(0x03); // EBU teletext subtitle data
        field.push(44);
        for &byte in unit {
            field.push(byte.reverse_bits());
        }
    }

    let header_data_length = if pts_ms.is_some() { 5 } else { 0 };
    let packet_length = 3 + header_data_length + field.len();

    let mut pes = vec![0x00, 0x00, 0x01, 0xBD];
    pes.push((packet_length >> 8) as u8);
    pes.push(packet_length as u8);
    pes.push(0x80);
    pes.push(if pts_ms.is_some() { 0x80 } else { 0x00 });
    pes.push(header_data_length as u8);
    if let Some(ms) = pts_ms {
        let value = ms * 90;
        pes.push(0x21 | (((value >> 30) as u8 & 0x07) << 1));
        pes.push((value >> 22) as u8);
        pes.push(0x01 | (((value >> 15) as u8 & 0x7F) << 1));
        pes.push((value >> 7) as u8);
        pes.push(0x01 | ((value as u8 & 0x7F) << 1));
    }
    pes.extend_from_slice(&field);
    pes
}

fn ts_packet(pid: u16, pusi: bool, cc: u8, payload: &[u8]) -> Vec<u8> {
    assert!(payload.len() <= 184);
    let mut packet = vec![0xFFu8; TS_PACKET_SIZE];
    packet[0] = 0x47;
    packet[1] = ((pusi as u8) << 6) | ((pid >> 8) as u8 & 0x1F);
    packet[2] = pid as u8;
    packet[3] = 0x10 | (cc & 0x0F);
    packet[4..4 + payload.len()].copy_from_slice(payload);
    packet
}

/// Splits a PES packet across TS packets, advancing the continuity counter.
fn ts_packets_for_pes(pid: u16, pes: &[u8], cc: &mut u8) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, chunk) in pes.chunks(184).enumerate() {
        out.extend(ts_packet(pid, i == 0, *cc, chunk));
        *cc = (*cc + 1) & 0x0F;
    }
    out
}

/// A stream of PES packets on the teletext PID, terminated by an empty
/// flusher PES so the last real packet gets delimited.
fn stream(pes_packets: &[Vec<u8>]) -> Vec<u8> {
    let mut cc = 0u8;
    let mut out = Vec::new();
    for pes in pes_packets {
        out.extend(ts_packets_for_pes(TELETEXT_PID, pes, &mut cc));
    }
    out.extend(ts_packets_for_pes(
        TELETEXT_PID,
        &teletext_pes(None, &[]),
        &mut cc,
    ));
    out
}

// --- PSI builders ---

fn psi_packet(pid: u16, section: &[u8]) -> Vec<u8> {
    let mut payload = vec![0x00]; // pointer field
    payload.extend_from_slice(section);
    ts_packet(pid, true, 0, &payload)
}

fn pat_section(program: u16, pmt_pid: u16) -> Vec<u8> {
    let mut section = vec![0x00, 0xB0, 13];
    section.extend_from_slice(&[0x00, 0x01]);
    section.push(0xC1);
    section.extend_from_slice(&[0x00, 0x00]);
    section.push((program >> 8) as u8);
    section.push(program as u8);
    section.push(0xE0 | ((pmt_pid >> 8) as u8 & 0x1F));
    section.push(pmt_pid as u8);
    section.extend_from_slice(&[0, 0, 0, 0]);
    section
}

fn pmt_section(teletext_pid: u16) -> Vec<u8> {
    let streams = [
        0x06,
        0xE0 | ((teletext_pid >> 8) as u8 & 0x1F),
        teletext_pid as u8,
        0xF0,
        0x02,
        0x56, // EBU teletext descriptor
        0x00,
    ];
    let section_length = 9 + streams.len() + 4;
    let mut section = vec![0x02, 0xB0 | ((section_length >> 8) as u8 & 0x0F), section_length as u8];
    section.extend_from_slice(&[0x00, 0x01]);
    section.push(0xC1);
    section.extend_from_slice(&[0x00, 0x00]);
    section.extend_from_slice(&[0xE0, 0x00]);
    section.extend_from_slice(&[0xF0, 0x00]);
    section.extend_from_slice(&streams);
    section.extend_from_slice(&[0, 0, 0, 0]);
    section
}

// --- scenarios ---

#[test]
fn test_end_to_end_two_frames() {
    let data = stream(&[
        teletext_pes(
            Some(1000),
            &[header_unit(0x888), row_unit(0x888, 2, "First line")],
        ),
        teletext_pes(
            Some(5000),
            &[header_unit(0x888), row_unit(0x888, 2, "Second line")],
        ),
        teletext_pes(Some(9000), &[header_unit(0x888)]),
    ]);

    let options = ExtractOptions::new().page(888);
    let frames = extract(std::io::Cursor::new(data), options).unwrap();

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].rows, vec!["First line".to_string()]);
    assert_eq!(frames[1].rows, vec!["Second line".to_string()]);

    // Timeline anchors at the first PTS; the first page hides one 25 fps
    // frame before the second appears.
    assert_eq!(frames[0].show.milliseconds, 0);
    assert_eq!(frames[0].hide.milliseconds, 3960);
    assert_eq!(frames[1].show.milliseconds, 4000);
    assert_eq!(frames[1].hide.milliseconds, 7960);
}

#[test]
fn test_multi_row_caption() {
    let data = stream(&[
        teletext_pes(
            Some(0),
            &[
                header_unit(0x888),
                row_unit(0x888, 21, "-Chci tu pracovat."),
                row_unit(0x888, 23, "-To je dobre."),
            ],
        ),
        teletext_pes(Some(4800), &[header_unit(0x888)]),
    ]);

    let frames = extract(std::io::Cursor::new(data), ExtractOptions::new().page(888)).unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(
        frames[0].rows,
        vec!["-Chci tu pracovat.".to_string(), "-To je dobre.".to_string()]
    );
}

#[test]
fn test_show_times_non_decreasing() {
    let data = stream(&[
        teletext_pes(Some(100), &[header_unit(0x888), row_unit(0x888, 1, "a")]),
        teletext_pes(Some(200), &[header_unit(0x888), row_unit(0x888, 1, "b")]),
        teletext_pes(Some(300), &[header_unit(0x888), row_unit(0x888, 1, "c")]),
        teletext_pes(Some(400), &[header_unit(0x888)]),
    ]);

    let frames = extract(std::io::Cursor::new(data), ExtractOptions::new().page(888)).unwrap();
    assert_eq!(frames.len(), 3);
    for pair in frames.windows(2) {
        assert!(pair[1].show >= pair[0].show);
    }
    for frame in &frames {
        assert!(frame.hide >= frame.show);
    }
}

#[test]
fn test_pid_discovery_via_pat_pmt() {
    let mut data = Vec::new();
    data.extend(psi_packet(0x0000, &pat_section(1, 0x0100)));
    data.extend(psi_packet(0x0100, &pmt_section(TELETEXT_PID)));
    data.extend(stream(&[
        teletext_pes(Some(0), &[header_unit(0x888), row_unit(0x888, 2, "found")]),
        teletext_pes(Some(2000), &[header_unit(0x888)]),
    ]));

    let mut extractor =
        TeletextExtractor::new(std::io::Cursor::new(data), ExtractOptions::new().page(888))
            .unwrap();
    let frames = extractor.run().unwrap();

    assert_eq!(extractor.teletext_pid(), TELETEXT_PID);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].rows, vec!["found".to_string()]);
}

#[test]
fn test_first_private_stream_adoption() {
    let data = stream(&[
        teletext_pes(Some(0), &[header_unit(0x888), row_unit(0x888, 2, "adopted")]),
        teletext_pes(Some(2000), &[header_unit(0x888)]),
    ]);

    let mut extractor = TeletextExtractor::new(
        std::io::Cursor::new(data),
        ExtractOptions::new().page(888).pid(0x2000),
    )
    .unwrap();
    let frames = extractor.run().unwrap();

    assert_eq!(extractor.teletext_pid(), TELETEXT_PID);
    assert_eq!(frames.len(), 1);
}

#[test]
fn test_page_auto_adoption() {
    let data = stream(&[
        teletext_pes(Some(0), &[header_unit(0x150), row_unit(0x150, 2, "auto")]),
        teletext_pes(Some(2000), &[header_unit(0x150)]),
    ]);

    let mut extractor =
        TeletextExtractor::new(std::io::Cursor::new(data), ExtractOptions::new()).unwrap();
    let frames = extractor.run().unwrap();

    assert_eq!(extractor.target_page(), 0x150);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].rows, vec!["auto".to_string()]);
}

#[test]
fn test_pts_wrap_keeps_frames_ascending() {
    // PTS drops near the 33-bit wrap point; output must keep ascending.
    let data = stream(&[
        teletext_pes(
            Some(95_443_700),
            &[header_unit(0x888), row_unit(0x888, 2, "before wrap")],
        ),
        teletext_pes(
            Some(10),
            &[header_unit(0x888), row_unit(0x888, 2, "after wrap")],
        ),
        teletext_pes(Some(2000), &[header_unit(0x888)]),
    ]);

    let frames = extract(std::io::Cursor::new(data), ExtractOptions::new().page(888)).unwrap();
    assert_eq!(frames.len(), 2);
    assert!(frames[1].show > frames[0].show);
}

#[test]
fn test_m2ts_output_matches_ts() {
    let ts = stream(&[
        teletext_pes(Some(40), &[header_unit(0x888), row_unit(0x888, 2, "same")]),
        teletext_pes(Some(4760), &[header_unit(0x888)]),
    ]);

    // The M2TS variant wraps every packet in a 4-byte BDAV prefix.
    let mut m2ts = Vec::new();
    for chunk in ts.chunks(TS_PACKET_SIZE) {
        m2ts.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        m2ts.extend_from_slice(chunk);
    }

    let ts_frames =
        extract(std::io::Cursor::new(ts), ExtractOptions::new().page(888)).unwrap();
    let m2ts_frames = extract(
        std::io::Cursor::new(m2ts),
        ExtractOptions::new().page(888).m2ts(true),
    )
    .unwrap();

    assert_eq!(ts_frames, m2ts_frames);
}

#[test]
fn test_no_matching_page_produces_no_frames() {
    let data = stream(&[
        teletext_pes(Some(0), &[header_unit(0x150), row_unit(0x150, 2, "other")]),
        teletext_pes(Some(2000), &[header_unit(0x150)]),
    ]);

    let mut extractor =
        TeletextExtractor::new(std::io::Cursor::new(data), ExtractOptions::new().page(888))
            .unwrap();
    let frames = extractor.run().unwrap();

    assert!(frames.is_empty());
    // The stream still reveals where subtitles live.
    assert_eq!(extractor.subtitle_pages(), vec![0x150]);
}

#[test]
fn test_empty_units_are_idempotent() {
    let real = [
        teletext_pes(Some(0), &[header_unit(0x888), row_unit(0x888, 2, "stable")]),
        teletext_pes(Some(2000), &[header_unit(0x888)]),
    ];
    let baseline = extract(
        std::io::Cursor::new(stream(&real)),
        ExtractOptions::new().page(888),
    )
    .unwrap();

    // Interleave empty payload units (no PTS, no data units) between the
    // real packets.
    let empty = teletext_pes(None, &[]);
    let padded = [
        real[0].clone(),
        empty.clone(),
        empty.clone(),
        empty,
        real[1].clone(),
    ];
    let padded_frames = extract(
        std::io::Cursor::new(stream(&padded)),
        ExtractOptions::new().page(888),
    )
    .unwrap();

    assert_eq!(baseline, padded_frames);
}

#[test]
fn test_continuity_gap_discards_pes() {
    let mut cc = 0u8;
    let mut data = Vec::new();
    data.extend(ts_packets_for_pes(
        TELETEXT_PID,
        &teletext_pes(Some(0), &[header_unit(0x888), row_unit(0x888, 2, "one")]),
        &mut cc,
    ));

    // Long PES spanning multiple TS packets; its tail goes missing.
    let long = teletext_pes(
        Some(1000),
        &[
            header_unit(0x888),
            row_unit(0x888, 1, "lost"),
            row_unit(0x888, 2, "lost"),
            row_unit(0x888, 3, "lost"),
            row_unit(0x888, 4, "lost"),
        ],
    );
    let long_packets = ts_packets_for_pes(TELETEXT_PID, &long, &mut cc);
    assert!(long_packets.len() >= 2 * TS_PACKET_SIZE);
    data.extend_from_slice(&long_packets[..TS_PACKET_SIZE]);

    // The packet revealing the gap is dropped along with the stale buffer;
    // reception resumes at the payload-unit start after it.
    data.extend(ts_packets_for_pes(
        TELETEXT_PID,
        &teletext_pes(Some(2000), &[header_unit(0x888), row_unit(0x888, 2, "casualty")]),
        &mut cc,
    ));
    data.extend(ts_packets_for_pes(
        TELETEXT_PID,
        &teletext_pes(Some(3000), &[header_unit(0x888), row_unit(0x888, 2, "three")]),
        &mut cc,
    ));
    data.extend(ts_packets_for_pes(
        TELETEXT_PID,
        &teletext_pes(Some(5000), &[header_unit(0x888)]),
        &mut cc,
    ));
    data.extend(ts_packets_for_pes(
        TELETEXT_PID,
        &teletext_pes(None, &[]),
        &mut cc,
    ));

    let mut extractor =
        TeletextExtractor::new(std::io::Cursor::new(data), ExtractOptions::new().page(888))
            .unwrap();
    let frames = extractor.run().unwrap();

    assert!(extractor.stats().continuity_errors >= 1);
    let texts: Vec<_> = frames
        .iter()
        .flat_map(|f| f.rows.iter().cloned())
        .collect();
    assert!(texts.contains(&"one".to_string()));
    assert!(texts.contains(&"three".to_string()));
    assert!(!texts.contains(&"lost".to_string()));
    assert!(!texts.contains(&"casualty".to_string()));
}

#[test]
fn test_end_of_stream_flushes_tainted_page() {
    // No further header for the page arrives; at end of input the page
    // hides at the last decoded timestamp (7000, from the empty packet).
    let data = stream(&[
        teletext_pes(Some(0), &[header_unit(0x888), row_unit(0x888, 2, "tail")]),
        teletext_pes(Some(7000), &[]),
    ]);

    let frames = extract(std::io::Cursor::new(data), ExtractOptions::new().page(888)).unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].rows, vec!["tail".to_string()]);
    assert_eq!(frames[0].show.milliseconds, 0);
    assert_eq!(frames[0].hide.milliseconds, 7000);
}

#[test]
fn test_colour_mode_emits_font_tags() {
    let magazine = 8u8;
    let mut row = [with_odd_parity(b' '); 40];
    row[0] = with_odd_parity(0x03); // yellow before the box
    row[1] = with_odd_parity(0x0B);
    for (i, b) in "tagged".bytes().enumerate() {
        row[2 + i] = with_odd_parity(b);
    }
    let coloured = unit(magazine, 2, row);

    let data = stream(&[
        teletext_pes(Some(0), &[header_unit(0x888), coloured]),
        teletext_pes(Some(2000), &[header_unit(0x888)]),
    ]);

    let frames = extract(
        std::io::Cursor::new(data),
        ExtractOptions::new().page(888).colours(true),
    )
    .unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(
        frames[0].rows,
        vec!["<font color=\"#ffff00\">tagged</font>".to_string()]
    );
}
