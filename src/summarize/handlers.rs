//! Per-record-type handler contracts (§4.3).
//!
//! Each function decodes nothing itself — that's already done by the
//! time `dispatch::handle` calls in — and binds the typed view's fields
//! to a cached prepared statement. Sentinel substitution (missing
//! coordinates, `0xFFFFFFFF` counts) happens here, at the SQL boundary,
//! rather than in `codec`.

use rusqlite::params;

use crate::codec::records::{BinRecord, Mir, Pcr, Pir, Prr, TestHeader, TestMeta, Tsr, Wcr, Wir, Wrr};
use crate::codec::{record_codes, Endian};

use super::{head_site_key, State, SummarizeError};

fn insert_file_info(state: &State, field: &str, value: impl ToString) -> Result<(), SummarizeError> {
    state
        .conn
        .prepare_cached("INSERT INTO File_Info (Field, Value) VALUES (?1, ?2)")?
        .execute(params![field, value.to_string()])?;
    Ok(())
}

/// Renders a float the way C's `%g` would, at the default precision of
/// six significant digits: fixed-point within `1e-4 <= |v| < 1e6`,
/// scientific notation outside that range, trailing zeros (and a bare
/// trailing `.`) stripped either way.
fn format_g(v: f32) -> String {
    let v = v as f64;
    if v == 0.0 {
        return "0".to_string();
    }
    if !v.is_finite() {
        return format!("{v}");
    }

    const PRECISION: i32 = 6;
    // Round to PRECISION significant digits via scientific formatting,
    // then read back the exponent that rounding landed on (rounding a
    // value like 999999.9 can carry into the next power of ten).
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, v);
    let (mantissa, exp_str) = sci.split_once('e').expect("scientific format always contains 'e'");
    let exp: i32 = exp_str.parse().expect("exponent is a valid integer");

    if exp < -4 || exp >= PRECISION {
        format!("{}e{:+03}", strip_trailing_zeros(mantissa), exp)
    } else {
        let decimals = (PRECISION - 1 - exp).max(0) as usize;
        strip_trailing_zeros(&format!("{v:.decimals$}"))
    }
}

/// Strips trailing fractional zeros from a formatted decimal, and the
/// decimal point itself if nothing is left after it — `%g` never emits
/// a bare trailing `.` or padding zeros.
fn strip_trailing_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn human_endian(endian: Endian) -> &'static str {
    let host_le = cfg!(target_endian = "little");
    let need_swap = matches!(endian, Endian::Big);
    if host_le ^ need_swap {
        "Little Endian"
    } else {
        "Big Endian"
    }
}

fn format_epoch(seconds: u32) -> String {
    // UTC, no calendar dependency: days since epoch via civil_from_days.
    let (y, m, d, h, min, s) = civil_from_unix(seconds as i64);
    format!("{y:04}-{m:02}-{d:02} {h:02}:{min:02}:{s:02} (UTC)")
}

/// Howard Hinnant's days-from-civil algorithm, run in reverse, to avoid
/// pulling in a full calendar crate for one timestamp format.
fn civil_from_unix(unix: i64) -> (i64, u32, u32, u32, u32, u32) {
    let days = unix.div_euclid(86_400);
    let secs_of_day = unix.rem_euclid(86_400);
    let h = (secs_of_day / 3600) as u32;
    let min = (secs_of_day % 3600 / 60) as u32;
    let s = (secs_of_day % 60) as u32;

    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let y = if m <= 2 { y + 1 } else { y };

    (y, m, d, h, min, s)
}

/// Records the detected byte order into `File_Info` — done once, as soon
/// as the reader's `SetEndian` message arrives, rather than deferred to
/// MIR: a file with no MIR at all (scenario: FAR only) still reports
/// `BYTE_ORD` (§8, end-to-end scenario 1).
pub(super) fn byte_order(state: &State, endian: Endian) -> Result<(), SummarizeError> {
    insert_file_info(state, "BYTE_ORD", human_endian(endian))
}

pub(super) fn mir(state: &mut State, mir: Mir, _endian: Endian) -> Result<(), SummarizeError> {
    insert_file_info(state, "SETUP_T", format_epoch(mir.setup_t))?;
    insert_file_info(state, "START_T", format_epoch(mir.start_t))?;
    insert_file_info(state, "STAT_NUM", mir.stat_num)?;

    for (field, code) in [
        ("MODE_COD", mir.mode_cod),
        ("RTST_COD", mir.rtst_cod),
        ("PROT_COD", mir.prot_cod),
        ("CMOD_COD", mir.cmod_cod),
    ] {
        if let Some(c) = code {
            if c != b' ' {
                insert_file_info(state, field, (c as char).to_string())?;
            }
        }
    }

    if let Some(burn_tim) = mir.burn_tim {
        if burn_tim != 65_535 {
            insert_file_info(state, "BURN_TIM", burn_tim)?;
        }
    }

    Ok(())
}

pub(super) fn pir(state: &mut State, pir: Pir) -> Result<(), SummarizeError> {
    state.dut_index += 1;
    state
        .conn
        .prepare_cached("INSERT INTO Dut_Info (HEAD_NUM, SITE_NUM, DUTIndex) VALUES (?1, ?2, ?3)")?
        .execute(params![pir.head_num, pir.site_num, state.dut_index])?;
    state
        .head_site_to_dut
        .insert(head_site_key(pir.head_num, pir.site_num), state.dut_index);
    Ok(())
}

pub(super) fn prr(state: &mut State, prr: Prr) -> Result<(), SummarizeError> {
    let dut_index = *state
        .head_site_to_dut
        .get(&head_site_key(prr.head_num, prr.site_num))
        .ok_or(SummarizeError::MapMissing("PRR"))?;
    let wafer_index = state.head_to_wafer.get(&prr.head_num).copied();

    let x_coord = if prr.x_coord == -32_768 { None } else { Some(prr.x_coord as i64) };
    let y_coord = if prr.y_coord == -32_768 { None } else { Some(prr.y_coord as i64) };

    state
        .conn
        .prepare_cached(
            "UPDATE Dut_Info SET TestCount = ?1, TestTime = ?2, PartID = ?3, HBIN = ?4, \
             SBIN = ?5, Flag = ?6, WaferIndex = ?7, XCOORD = ?8, YCOORD = ?9 WHERE DUTIndex = ?10",
        )?
        .execute(params![
            prr.num_test,
            prr.test_t,
            prr.part_id,
            prr.hard_bin,
            prr.soft_bin,
            prr.part_flg,
            wafer_index,
            x_coord,
            y_coord,
            dut_index,
        ])?;

    let pf = pass_fail_from_part_flg(prr.part_flg);
    upsert_inferred_bin(state, "H", prr.hard_bin, pf)?;
    upsert_inferred_bin(state, "S", prr.soft_bin, pf)?;

    state.checkpoint()?;
    Ok(())
}

fn pass_fail_from_part_flg(part_flg: u8) -> char {
    if part_flg & 0b0001_1000 == 0 {
        'P'
    } else if part_flg & 0b0001_0000 == 0 {
        'F'
    } else {
        'U'
    }
}

/// Inserts a `Bin_Info` row only if no authoritative HBR/SBR has already
/// written one for this `(BIN_TYPE, BIN_NUM)` — an HBR/SBR always wins
/// (P6), so this is `INSERT OR IGNORE`, never an upsert over an existing row.
fn upsert_inferred_bin(state: &State, bin_type: &str, bin_num: u16, pf: char) -> Result<(), SummarizeError> {
    state
        .conn
        .prepare_cached(
            "INSERT OR IGNORE INTO Bin_Info (BIN_TYPE, BIN_NUM, BIN_NAME, BIN_PF) VALUES (?1, ?2, ?3, ?4)",
        )?
        .execute(params![bin_type, bin_num, "MissingName", pf.to_string()])?;
    Ok(())
}

pub(super) fn tr_family(
    state: &mut State,
    header: TestHeader,
    meta: TestMeta,
    record_code: u16,
    file_offset: u64,
    raw_len: u16,
) -> Result<(), SummarizeError> {
    let dut_index = *state
        .head_site_to_dut
        .get(&head_site_key(header.head_num, header.site_num))
        .ok_or(SummarizeError::MapMissing("TR family"))?;

    // `file_offset` is the byte just past the 4-byte header, i.e. the
    // start of the payload. Stored as-is: `paramread::decode_row` seeks
    // straight to `Offset` and reads `BinaryLen` payload bytes with no
    // header skip of its own, and P5's "seek Offset-4, read BinaryLen+4"
    // recovers the header-inclusive record only if `Offset` is the
    // payload start, not the header start.
    state
        .conn
        .prepare_cached(
            "INSERT OR REPLACE INTO Test_Offsets (DUTIndex, TEST_NUM, Offset, BinaryLen) VALUES (?1, ?2, ?3, ?4)",
        )?
        .execute(params![dut_index, header.test_num, file_offset, raw_len])?;

    if state.seen_test_nums.insert(header.test_num) {
        state
            .conn
            .prepare_cached(
                "INSERT INTO Test_Info (TEST_NUM, recHeader, TEST_NAME, RES_SCAL, LLimit, HLimit, \
                 Unit, OPT_FLAG, FailCount) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, -1)",
            )?
            .execute(params![
                header.test_num,
                record_code,
                meta.test_txt,
                meta.res_scal,
                meta.lo_limit,
                meta.hi_limit,
                meta.units,
                meta.opt_flag,
            ])?;
    }

    Ok(())
}

pub(super) fn bin_record(state: &mut State, bin: BinRecord, record_code: u16) -> Result<(), SummarizeError> {
    let bin_type = if record_code == record_codes::HBR { "H" } else { "S" };
    let pf = match bin.bin_pf {
        Some(b'P') => 'P',
        Some(b'F') => 'F',
        _ => 'U',
    };
    let name = bin.bin_nam.unwrap_or_else(|| "MissingName".to_string());

    state
        .conn
        .prepare_cached(
            "INSERT OR REPLACE INTO Bin_Info (BIN_TYPE, BIN_NUM, BIN_NAME, BIN_PF) VALUES (?1, ?2, ?3, ?4)",
        )?
        .execute(params![bin_type, bin.bin_num, name, pf.to_string()])?;
    Ok(())
}

pub(super) fn wir(state: &mut State, wir: Wir) -> Result<(), SummarizeError> {
    state.wafer_index += 1;
    state
        .conn
        .prepare_cached("INSERT INTO Wafer_Info (HEAD_NUM, WaferIndex, WAFER_ID) VALUES (?1, ?2, ?3)")?
        .execute(params![wir.head_num, state.wafer_index, wir.wafer_id])?;
    state.head_to_wafer.insert(wir.head_num, state.wafer_index);
    Ok(())
}

pub(super) fn wrr(state: &mut State, wrr: Wrr) -> Result<(), SummarizeError> {
    let wafer_index = *state
        .head_to_wafer
        .get(&wrr.head_num)
        .ok_or(SummarizeError::MapMissing("WRR"))?;

    let sentinel = |v: Option<u32>| -> Option<i64> {
        v.map(|n| if n == 0xFFFF_FFFF { -1 } else { n as i64 })
    };

    state
        .conn
        .prepare_cached(
            "UPDATE Wafer_Info SET PART_CNT = ?1, RTST_CNT = ?2, ABRT_CNT = ?3, GOOD_CNT = ?4, \
             FUNC_CNT = ?5, FABWF_ID = ?6, FRAME_ID = ?7, MASK_ID = ?8, USR_DESC = ?9, \
             EXC_DESC = ?10 WHERE WaferIndex = ?11",
        )?
        .execute(params![
            wrr.part_cnt,
            sentinel(wrr.rtst_cnt),
            sentinel(wrr.abrt_cnt),
            sentinel(wrr.good_cnt),
            sentinel(wrr.func_cnt),
            wrr.fabwf_id,
            wrr.frame_id,
            wrr.mask_id,
            wrr.usr_desc,
            wrr.exc_desc,
            wafer_index,
        ])?;
    Ok(())
}

pub(super) fn wcr(state: &mut State, wcr: Wcr) -> Result<(), SummarizeError> {
    let units = match wcr.wf_units {
        1 => "inch",
        2 => "cm",
        3 => "mm",
        _ => "mil",
    };

    insert_file_info(state, "WAFR_SIZ", format_g(wcr.wafr_siz))?;
    insert_file_info(state, "DIE_HT", format_g(wcr.die_ht))?;
    insert_file_info(state, "DIE_WID", format_g(wcr.die_wid))?;
    insert_file_info(state, "WF_UNITS", units)?;

    if let Some(flat) = wcr.wf_flat {
        insert_file_info(state, "WF_FLAT", (flat as char).to_string())?;
    }
    if let (Some(cx), Some(cy)) = (wcr.center_x, wcr.center_y) {
        insert_file_info(state, "CENTER_X", cx)?;
        insert_file_info(state, "CENTER_Y", cy)?;
    }
    if let Some(pos_x) = wcr.pos_x {
        insert_file_info(state, "POS_X", (pos_x as char).to_string())?;
    }
    if let Some(pos_y) = wcr.pos_y {
        insert_file_info(state, "POS_Y", (pos_y as char).to_string())?;
    }

    Ok(())
}

pub(super) fn tsr(state: &mut State, tsr: Tsr) -> Result<(), SummarizeError> {
    if tsr.fail_cnt == 0xFFFF_FFFF {
        return Ok(());
    }
    *state.test_fail_count.entry(tsr.test_num).or_insert(0) += tsr.fail_cnt as i64;
    Ok(())
}

pub(super) fn pcr(state: &mut State, pcr: Pcr) -> Result<(), SummarizeError> {
    let sentinel = |n: u32| -> i64 {
        if n == 0xFFFF_FFFF {
            -1
        } else {
            n as i64
        }
    };

    state
        .conn
        .prepare_cached(
            "INSERT INTO Dut_Counts (HEAD_NUM, SITE_NUM, PART_CNT, RTST_CNT, ABRT_CNT, GOOD_CNT, FUNC_CNT) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?
        .execute(params![
            pcr.head_num,
            pcr.site_num,
            sentinel(pcr.part_cnt),
            sentinel(pcr.rtst_cnt),
            sentinel(pcr.abrt_cnt),
            sentinel(pcr.good_cnt),
            sentinel(pcr.func_cnt),
        ])?;
    Ok(())
}
