use tempfile::NamedTempFile;

use crate::codec::Endian;

use super::{dispatch, State};

fn open_test_db() -> (State, NamedTempFile) {
    let f = NamedTempFile::new().expect("tempfile");
    let state = State::open(f.path()).expect("open db");
    (state, f)
}

fn le(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

/// Scenario 2 from the testable-properties section: FAR, MIR, one PIR,
/// one PTR, one PRR.
#[test]
fn single_dut_one_ptr_populates_expected_rows() {
    let (mut state, _f) = open_test_db();

    let pir_bytes = [1u8, 1u8]; // head=1, site=1
    dispatch::handle(&mut state, crate::codec::record_codes::PIR, 100, &pir_bytes, 2, Endian::Little).unwrap();

    let ptr_bytes = le(&[
        &100u32.to_le_bytes(),
        &[1u8, 1u8, 0u8],
        &[0u8],
        &1.23f32.to_le_bytes(),
        &[4u8, b't', b'e', b's', b't'],
        &[0u8],
        &[0u8],
        &[0i8 as u8],
        &[0u8],
        &[0u8],
        &0.0f32.to_le_bytes(),
        &0.0f32.to_le_bytes(),
        &[0u8],
    ]);
    dispatch::handle(
        &mut state,
        crate::codec::record_codes::PTR,
        200,
        &ptr_bytes,
        ptr_bytes.len() as u16,
        Endian::Little,
    )
    .unwrap();

    let prr_bytes = le(&[
        &[1u8, 1u8, 0u8],
        &1u16.to_le_bytes(),
        &1u16.to_le_bytes(),
        &1u16.to_le_bytes(),
        &5i16.to_le_bytes(),
        &6i16.to_le_bytes(),
        &0u32.to_le_bytes(),
        &[0u8],
    ]);
    dispatch::handle(
        &mut state,
        crate::codec::record_codes::PRR,
        300,
        &prr_bytes,
        prr_bytes.len() as u16,
        Endian::Little,
    )
    .unwrap();

    state.finish().unwrap();

    let dut_count: i64 = state
        .conn
        .query_row("SELECT COUNT(*) FROM Dut_Info", [], |r| r.get(0))
        .unwrap();
    assert_eq!(dut_count, 1);

    let (hbin, sbin, x, y): (i64, i64, i64, i64) = state
        .conn
        .query_row("SELECT HBIN, SBIN, XCOORD, YCOORD FROM Dut_Info", [], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?))
        })
        .unwrap();
    assert_eq!((hbin, sbin, x, y), (1, 1, 5, 6));

    let fail_count: i64 = state
        .conn
        .query_row(
            "SELECT FailCount FROM Test_Info WHERE TEST_NUM = 100",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(fail_count, -1);

    let bin_rows: i64 = state.conn.query_row("SELECT COUNT(*) FROM Bin_Info", [], |r| r.get(0)).unwrap();
    assert_eq!(bin_rows, 2);

    let hbin_pf: String = state
        .conn
        .query_row(
            "SELECT BIN_PF FROM Bin_Info WHERE BIN_TYPE = 'H' AND BIN_NUM = 1",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(hbin_pf, "P");
}

/// B2: PRR with X_COORD = -32768 stores NULL, not -32768.
#[test]
fn prr_missing_coordinate_stores_null() {
    let (mut state, _f) = open_test_db();
    dispatch::handle(&mut state, crate::codec::record_codes::PIR, 0, &[1u8, 1u8], 2, Endian::Little).unwrap();

    let prr_bytes = le(&[
        &[1u8, 1u8, 0u8],
        &0u16.to_le_bytes(),
        &1u16.to_le_bytes(),
        &1u16.to_le_bytes(),
        &(-32_768i16).to_le_bytes(),
        &6i16.to_le_bytes(),
        &0u32.to_le_bytes(),
    ]);
    dispatch::handle(
        &mut state,
        crate::codec::record_codes::PRR,
        300,
        &prr_bytes,
        prr_bytes.len() as u16,
        Endian::Little,
    )
    .unwrap();

    let x: Option<i64> = state
        .conn
        .query_row("SELECT XCOORD FROM Dut_Info", [], |r| r.get(0))
        .unwrap();
    assert_eq!(x, None);
}

/// P1: a PRR with no matching PIR is a MapMissing error.
#[test]
fn prr_without_pir_is_map_missing() {
    let (mut state, _f) = open_test_db();
    let prr_bytes = le(&[
        &[9u8, 9u8, 0u8],
        &0u16.to_le_bytes(),
        &1u16.to_le_bytes(),
        &1u16.to_le_bytes(),
        &0i16.to_le_bytes(),
        &0i16.to_le_bytes(),
        &0u32.to_le_bytes(),
    ]);
    let result = dispatch::handle(
        &mut state,
        crate::codec::record_codes::PRR,
        300,
        &prr_bytes,
        prr_bytes.len() as u16,
        Endian::Little,
    );
    assert!(matches!(result, Err(super::SummarizeError::MapMissing("PRR"))));
}

/// B3: WRR counts of 0xFFFFFFFF are stored as -1.
#[test]
fn wrr_sentinel_count_stored_as_negative_one() {
    let (mut state, _f) = open_test_db();
    let wir_bytes = le(&[&[1u8, 0u8], &0u32.to_le_bytes(), &[4u8, b'W', b'0', b'0', b'1']]);
    dispatch::handle(&mut state, crate::codec::record_codes::WIR, 0, &wir_bytes, wir_bytes.len() as u16, Endian::Little)
        .unwrap();

    let wrr_bytes = le(&[
        &[1u8, 0u8],
        &0u32.to_le_bytes(),
        &1u32.to_le_bytes(),
        &0xFFFF_FFFFu32.to_le_bytes(),
        &0u32.to_le_bytes(),
        &1u32.to_le_bytes(),
        &0u32.to_le_bytes(),
    ]);
    dispatch::handle(&mut state, crate::codec::record_codes::WRR, 0, &wrr_bytes, wrr_bytes.len() as u16, Endian::Little)
        .unwrap();

    let rtst_cnt: i64 = state
        .conn
        .query_row("SELECT RTST_CNT FROM Wafer_Info", [], |r| r.get(0))
        .unwrap();
    assert_eq!(rtst_cnt, -1);
}

/// B1: a PTR with omitted limits on the second occurrence of a test
/// number does not overwrite the limits captured on the first.
#[test]
fn second_ptr_occurrence_does_not_overwrite_first_limits() {
    let (mut state, _f) = open_test_db();
    dispatch::handle(&mut state, crate::codec::record_codes::PIR, 0, &[1u8, 1u8], 2, Endian::Little).unwrap();

    let full_ptr = le(&[
        &100u32.to_le_bytes(),
        &[1u8, 1u8, 0u8],
        &[0u8],
        &1.0f32.to_le_bytes(),
        &[4u8, b't', b'e', b's', b't'],
        &[0u8],
        &[0u8],
        &[0u8],
        &[0u8],
        &[0u8],
        &1.0f32.to_le_bytes(),
        &9.0f32.to_le_bytes(),
        &[1u8, b'V'],
    ]);
    dispatch::handle(&mut state, crate::codec::record_codes::PTR, 200, &full_ptr, full_ptr.len() as u16, Endian::Little)
        .unwrap();

    // second PTR for the same test number, with everything past TEST_FLG omitted.
    let bare_ptr = le(&[&100u32.to_le_bytes(), &[1u8, 1u8, 0u8]]);
    dispatch::handle(&mut state, crate::codec::record_codes::PTR, 400, &bare_ptr, bare_ptr.len() as u16, Endian::Little)
        .unwrap();

    let hi_limit: f64 = state
        .conn
        .query_row("SELECT HLimit FROM Test_Info WHERE TEST_NUM = 100", [], |r| r.get(0))
        .unwrap();
    assert_eq!(hi_limit, 9.0);
}
