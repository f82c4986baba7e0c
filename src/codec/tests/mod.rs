use rand::Rng;

use crate::codec::records::{self, BinRecord, Far, Mir, Pir, Prr, Ptr, Tsr, Wcr, Wir, Wrr};
use crate::codec::{record_codes, Cursor, Endian};

fn le_bytes(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

#[test]
fn cursor_reads_little_endian_primitives() {
    let buf = [0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
    let mut c = Cursor::new(&buf);
    assert_eq!(c.u2(Endian::Little).unwrap(), 0x1234);
    assert_eq!(c.u4(Endian::Little).unwrap(), 0x1234_5678);
}

#[test]
fn cursor_reads_big_endian_primitives() {
    let buf = [0x12, 0x34, 0x12, 0x34, 0x56, 0x78];
    let mut c = Cursor::new(&buf);
    assert_eq!(c.u2(Endian::Big).unwrap(), 0x1234);
    assert_eq!(c.u4(Endian::Big).unwrap(), 0x1234_5678);
}

#[test]
fn cursor_reports_eof_on_short_buffer() {
    let buf = [0x01];
    let mut c = Cursor::new(&buf);
    assert!(c.u2(Endian::Little).is_err());
}

#[test]
fn cursor_reads_cn_string() {
    let buf = [3u8, b'a', b'b', b'c'];
    let mut c = Cursor::new(&buf);
    assert_eq!(c.cn().unwrap(), "abc");
    assert!(!c.has_more());
}

#[test]
fn cursor_reads_kxu2_array() {
    let buf = [0x01, 0x00, 0x02, 0x00, 0x03, 0x00];
    let mut c = Cursor::new(&buf);
    assert_eq!(c.kxu2(3, Endian::Little).unwrap(), vec![1, 2, 3]);
}

#[test]
fn far_decodes_cpu_type_and_version() {
    let buf = [2u8, 4u8];
    let far = Far::decode(&buf).unwrap();
    assert_eq!(far.cpu_type, 2);
    assert_eq!(far.stdf_ver, 4);
}

#[test]
fn mir_decodes_fixed_and_trailing_optional_fields() {
    let buf = le_bytes(&[
        &1_700_000_000u32.to_le_bytes(),
        &1_700_000_100u32.to_le_bytes(),
        &[7u8],           // STAT_NUM
        &[b'P'],          // MODE_COD
        &[0x20],          // RTST_COD (space -> skipped by handler, still decoded here)
        &[b'P'],          // PROT_COD
        &100u16.to_le_bytes(), // BURN_TIM
        &[b'C'],          // CMOD_COD
    ]);
    let mir = Mir::decode(&buf, Endian::Little).unwrap();
    assert_eq!(mir.setup_t, 1_700_000_000);
    assert_eq!(mir.start_t, 1_700_000_100);
    assert_eq!(mir.stat_num, 7);
    assert_eq!(mir.mode_cod, Some(b'P'));
    assert_eq!(mir.rtst_cod, Some(0x20));
    assert_eq!(mir.burn_tim, Some(100));
    assert_eq!(mir.cmod_cod, Some(b'C'));
}

#[test]
fn mir_treats_short_payload_as_missing_trailing_fields() {
    let buf = le_bytes(&[
        &1_700_000_000u32.to_le_bytes(),
        &1_700_000_100u32.to_le_bytes(),
        &[7u8],
    ]);
    let mir = Mir::decode(&buf, Endian::Little).unwrap();
    assert_eq!(mir.mode_cod, None);
    assert_eq!(mir.rtst_cod, None);
    assert_eq!(mir.burn_tim, None);
    assert_eq!(mir.cmod_cod, None);
}

#[test]
fn pir_decodes_head_and_site() {
    let buf = [1u8, 2u8];
    let pir = Pir::decode(&buf).unwrap();
    assert_eq!(pir.head_num, 1);
    assert_eq!(pir.site_num, 2);
}

#[test]
fn prr_decodes_coordinates_and_optional_part_id() {
    let buf = le_bytes(&[
        &[1u8, 1u8, 0u8],
        &1u16.to_le_bytes(),
        &1u16.to_le_bytes(),
        &1u16.to_le_bytes(),
        &(-32768i16).to_le_bytes(),
        &6i16.to_le_bytes(),
        &0u32.to_le_bytes(),
        &[3u8, b'D', b'1', b'2'],
    ]);
    let prr = Prr::decode(&buf, Endian::Little).unwrap();
    assert_eq!(prr.head_num, 1);
    assert_eq!(prr.site_num, 1);
    assert_eq!(prr.x_coord, -32768);
    assert_eq!(prr.y_coord, 6);
    assert_eq!(prr.part_id.as_deref(), Some("D12"));
}

#[test]
fn ptr_decodes_result_and_limits() {
    let buf = le_bytes(&[
        &100u32.to_le_bytes(), // TEST_NUM
        &[1u8, 1u8, 0u8],      // HEAD_NUM, SITE_NUM, TEST_FLG
        &[0u8],                // PARM_FLG
        &1.23f32.to_le_bytes(),
        &[4u8, b't', b'e', b's', b't'], // TEST_TXT
        &[0u8],                         // ALARM_ID len 0
        &[0u8],                         // OPT_FLAG
        &[2i8 as u8],                   // RES_SCAL
        &[0u8],                         // LLM_SCAL
        &[0u8],                         // HLM_SCAL
        &0.0f32.to_le_bytes(),
        &10.0f32.to_le_bytes(),
        &[1u8, b'V'],
    ]);
    let ptr = Ptr::decode(&buf, Endian::Little).unwrap();
    assert_eq!(ptr.header.test_num, 100);
    assert_eq!(ptr.header.test_flg, 0);
    assert_eq!(ptr.result, Some(1.23));
    assert_eq!(ptr.meta.test_txt.as_deref(), Some("test"));
    assert_eq!(ptr.meta.res_scal, Some(2));
    assert_eq!(ptr.meta.hi_limit, Some(10.0));
    assert_eq!(ptr.meta.units.as_deref(), Some("V"));
}

#[test]
fn tsr_decodes_fail_count() {
    let buf = le_bytes(&[
        &[1u8, 1u8, b'P'],
        &100u32.to_le_bytes(),
        &50u32.to_le_bytes(),
        &3u32.to_le_bytes(),
    ]);
    let tsr = Tsr::decode(&buf, Endian::Little).unwrap();
    assert_eq!(tsr.test_num, 100);
    assert_eq!(tsr.fail_cnt, 3);
}

#[test]
fn bin_record_decodes_name_and_pf() {
    let buf = le_bytes(&[
        &[1u8, 1u8],
        &1u16.to_le_bytes(),
        &10u32.to_le_bytes(),
        &[b'P'],
        &[4u8, b'P', b'A', b'S', b'S'],
    ]);
    let bin = BinRecord::decode(&buf, Endian::Little).unwrap();
    assert_eq!(bin.bin_num, 1);
    assert_eq!(bin.bin_pf, Some(b'P'));
    assert_eq!(bin.bin_nam.as_deref(), Some("PASS"));
}

#[test]
fn wir_decodes_wafer_id() {
    let buf = le_bytes(&[
        &[1u8, 0u8],
        &1_700_000_000u32.to_le_bytes(),
        &[4u8, b'W', b'0', b'0', b'1'],
    ]);
    let wir = Wir::decode(&buf, Endian::Little).unwrap();
    assert_eq!(wir.head_num, 1);
    assert_eq!(wir.wafer_id.as_deref(), Some("W001"));
}

#[test]
fn wrr_decodes_counts() {
    let buf = le_bytes(&[
        &[1u8, 0u8],
        &1_700_000_000u32.to_le_bytes(),
        &1u32.to_le_bytes(),
        &0xFFFF_FFFFu32.to_le_bytes(),
        &0u32.to_le_bytes(),
        &1u32.to_le_bytes(),
        &0u32.to_le_bytes(),
    ]);
    let wrr = Wrr::decode(&buf, Endian::Little).unwrap();
    assert_eq!(wrr.part_cnt, 1);
    assert_eq!(wrr.rtst_cnt, Some(0xFFFF_FFFF));
}

/// Random truncated/garbage payloads never panic, for any of the
/// fourteen decodable record codes — malformed input must surface as a
/// `CodecError`, not an out-of-bounds access.
#[test]
fn decode_never_panics_on_random_bytes() {
    let mut rng = rand::rng();
    let codes = [
        record_codes::MIR,
        record_codes::PIR,
        record_codes::PRR,
        record_codes::PTR,
        record_codes::MPR,
        record_codes::FTR,
        record_codes::TSR,
        record_codes::HBR,
        record_codes::SBR,
        record_codes::WIR,
        record_codes::WRR,
        record_codes::WCR,
        record_codes::PCR,
        record_codes::PMR,
    ];

    for _ in 0..2_000 {
        let len = rng.random_range(0..64);
        let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
        let code = codes[rng.random_range(0..codes.len())];
        let endian = if rng.random_bool(0.5) { Endian::Little } else { Endian::Big };
        let _ = records::decode(code, &bytes, endian);
    }
}

#[test]
fn wcr_decodes_wafer_geometry() {
    let buf = le_bytes(&[
        &200.0f32.to_le_bytes(),
        &10.0f32.to_le_bytes(),
        &10.0f32.to_le_bytes(),
        &[3u8], // WF_UNITS = mm
        &[b'D'],
        &0i16.to_le_bytes(),
        &0i16.to_le_bytes(),
        &[b'U'],
        &[b'L'],
    ]);
    let wcr = Wcr::decode(&buf, Endian::Little).unwrap();
    assert_eq!(wcr.wafr_siz, 200.0);
    assert_eq!(wcr.wf_units, 3);
    assert_eq!(wcr.wf_flat, Some(b'D'));
}
