//! Typed views for the record codes the engine enqueues (spec §3.1/§4.3).
//!
//! Every struct here holds exactly the fields its corresponding handler
//! in [`crate::summarize::handlers`] reads — not the full STDF V4 field
//! set for that record. Trailing fields that STDF permits writers to
//! omit are `Option<T>`; once one optional field is missing, every field
//! after it is treated as missing too (matching the STDF convention that
//! optional fields are only ever omitted as a contiguous trailing run).
//!
//! Field layouts are grounded on the STDF V4 field tables of two
//! reference implementations (`noonchen/rust-stdf`'s `stdf_types.rs` and
//! `Kei0bb/STDF`'s `parser.rs`); see `DESIGN.md`.

use super::{Cursor, Endian, record_codes};
use crate::codec::CodecError;

/// FAR — File Attributes Record. Always the first record in a conforming file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Far {
    pub cpu_type: u8,
    pub stdf_ver: u8,
}

impl Far {
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut c = Cursor::new(bytes);
        Ok(Self {
            cpu_type: c.u1()?,
            stdf_ver: c.u1()?,
        })
    }
}

/// MIR — Master Information Record.
#[derive(Debug, Clone, PartialEq)]
pub struct Mir {
    pub setup_t: u32,
    pub start_t: u32,
    pub stat_num: u8,
    pub mode_cod: Option<u8>,
    pub rtst_cod: Option<u8>,
    pub prot_cod: Option<u8>,
    pub burn_tim: Option<u16>,
    pub cmod_cod: Option<u8>,
}

impl Mir {
    pub fn decode(bytes: &[u8], endian: Endian) -> Result<Self, CodecError> {
        let mut c = Cursor::new(bytes);
        let setup_t = c.u4(endian)?;
        let start_t = c.u4(endian)?;
        let stat_num = c.u1()?;

        let mode_cod = opt(&mut c, |c| c.u1());
        let rtst_cod = mode_cod.and(opt(&mut c, |c| c.u1()));
        let prot_cod = rtst_cod.and(opt(&mut c, |c| c.u1()));
        let burn_tim = prot_cod.and(opt(&mut c, |c| c.u2(endian)));
        let cmod_cod = burn_tim.and(opt(&mut c, |c| c.u1()));

        Ok(Self {
            setup_t,
            start_t,
            stat_num,
            mode_cod,
            rtst_cod,
            prot_cod,
            burn_tim,
            cmod_cod,
        })
    }
}

/// PMR — Pin Map Record. Decoded for completeness; the summarizer
/// discards the result (pin-index to name mapping is not persisted).
#[derive(Debug, Clone, PartialEq)]
pub struct Pmr {
    pub pmr_indx: u16,
    pub chan_typ: Option<u16>,
    pub chan_nam: Option<String>,
    pub phy_nam: Option<String>,
    pub log_nam: Option<String>,
    pub head_num: Option<u8>,
    pub site_num: Option<u8>,
}

impl Pmr {
    pub fn decode(bytes: &[u8], endian: Endian) -> Result<Self, CodecError> {
        let mut c = Cursor::new(bytes);
        let pmr_indx = c.u2(endian)?;

        let chan_typ = opt(&mut c, |c| c.u2(endian));
        let chan_nam = chan_typ.is_some().then(|| opt(&mut c, |c| c.cn())).flatten();
        let phy_nam = chan_nam.is_some().then(|| opt(&mut c, |c| c.cn())).flatten();
        let log_nam = phy_nam.is_some().then(|| opt(&mut c, |c| c.cn())).flatten();
        let head_num = log_nam.is_some().then(|| opt(&mut c, |c| c.u1())).flatten();
        let site_num = head_num.is_some().then(|| opt(&mut c, |c| c.u1())).flatten();

        Ok(Self {
            pmr_indx,
            chan_typ,
            chan_nam,
            phy_nam,
            log_nam,
            head_num,
            site_num,
        })
    }
}

/// PIR — Part Information Record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pir {
    pub head_num: u8,
    pub site_num: u8,
}

impl Pir {
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut c = Cursor::new(bytes);
        Ok(Self {
            head_num: c.u1()?,
            site_num: c.u1()?,
        })
    }
}

/// PRR — Part Results Record.
#[derive(Debug, Clone, PartialEq)]
pub struct Prr {
    pub head_num: u8,
    pub site_num: u8,
    pub part_flg: u8,
    pub num_test: u16,
    pub hard_bin: u16,
    pub soft_bin: u16,
    pub x_coord: i16,
    pub y_coord: i16,
    pub test_t: u32,
    pub part_id: Option<String>,
}

impl Prr {
    pub fn decode(bytes: &[u8], endian: Endian) -> Result<Self, CodecError> {
        let mut c = Cursor::new(bytes);
        let head_num = c.u1()?;
        let site_num = c.u1()?;
        let part_flg = c.u1()?;
        let num_test = c.u2(endian)?;
        let hard_bin = c.u2(endian)?;
        let soft_bin = c.u2(endian)?;
        let x_coord = c.i2(endian)?;
        let y_coord = c.i2(endian)?;
        let test_t = c.u4(endian)?;
        let part_id = opt(&mut c, |c| c.cn());

        Ok(Self {
            head_num,
            site_num,
            part_flg,
            num_test,
            hard_bin,
            soft_bin,
            x_coord,
            y_coord,
            test_t,
            part_id,
        })
    }
}

/// Common fields shared by PTR/MPR/FTR that the `Test_Offsets` handler
/// needs regardless of which of the three record types produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct TestHeader {
    pub test_num: u32,
    pub head_num: u8,
    pub site_num: u8,
    pub test_flg: u8,
}

/// First-seen test metadata captured into `Test_Info` (spec §4.3, "TR family").
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TestMeta {
    pub test_txt: Option<String>,
    pub res_scal: Option<i8>,
    pub lo_limit: Option<f32>,
    pub hi_limit: Option<f32>,
    pub units: Option<String>,
    pub opt_flag: Option<u8>,
}

/// PTR — Parametric Test Record.
#[derive(Debug, Clone, PartialEq)]
pub struct Ptr {
    pub header: TestHeader,
    pub result: Option<f32>,
    pub meta: TestMeta,
}

impl Ptr {
    pub fn decode(bytes: &[u8], endian: Endian) -> Result<Self, CodecError> {
        let mut c = Cursor::new(bytes);
        let test_num = c.u4(endian)?;
        let head_num = c.u1()?;
        let site_num = c.u1()?;
        let test_flg = c.u1()?;
        let _parm_flg = opt(&mut c, |c| c.u1());
        let result = _parm_flg.and(opt(&mut c, |c| c.r4(endian)));
        let test_txt = result.and(opt(&mut c, |c| c.cn()));
        let _alarm_id = test_txt.is_some().then(|| opt(&mut c, |c| c.cn())).flatten();
        let opt_flag = _alarm_id
            .is_some()
            .then(|| opt(&mut c, |c| c.u1()))
            .flatten();
        let res_scal = opt_flag.is_some().then(|| opt(&mut c, |c| c.i1())).flatten();
        let _llm_scal = res_scal.is_some().then(|| opt(&mut c, |c| c.i1())).flatten();
        let _hlm_scal = _llm_scal.is_some().then(|| opt(&mut c, |c| c.i1())).flatten();
        let lo_limit = _hlm_scal
            .is_some()
            .then(|| opt(&mut c, |c| c.r4(endian)))
            .flatten();
        let hi_limit = lo_limit.is_some().then(|| opt(&mut c, |c| c.r4(endian))).flatten();
        let units = hi_limit.is_some().then(|| opt(&mut c, |c| c.cn())).flatten();

        Ok(Self {
            header: TestHeader {
                test_num,
                head_num,
                site_num,
                test_flg,
            },
            result,
            meta: TestMeta {
                test_txt,
                res_scal,
                lo_limit,
                hi_limit,
                units,
                opt_flag,
            },
        })
    }
}

/// MPR — Multiple-Result Parametric Record.
#[derive(Debug, Clone, PartialEq)]
pub struct Mpr {
    pub header: TestHeader,
    pub meta: TestMeta,
}

impl Mpr {
    pub fn decode(bytes: &[u8], endian: Endian) -> Result<Self, CodecError> {
        let mut c = Cursor::new(bytes);
        let test_num = c.u4(endian)?;
        let head_num = c.u1()?;
        let site_num = c.u1()?;
        let test_flg = c.u1()?;
        let parm_flg = opt(&mut c, |c| c.u1());
        let rtn_icnt = parm_flg.and(opt(&mut c, |c| c.u2(endian)));
        let rslt_cnt = rtn_icnt.and(opt(&mut c, |c| c.u2(endian)));

        let mut after_arrays = rslt_cnt.is_some();
        if let (Some(j), Some(k)) = (rtn_icnt, rslt_cnt) {
            if c.kxu1(j as usize).is_err() || c.kxr4(k as usize, endian).is_err() {
                after_arrays = false;
            }
        }

        let test_txt = after_arrays.then(|| opt(&mut c, |c| c.cn())).flatten();
        let _alarm_id = test_txt.is_some().then(|| opt(&mut c, |c| c.cn())).flatten();
        let opt_flag = _alarm_id
            .is_some()
            .then(|| opt(&mut c, |c| c.u1()))
            .flatten();
        let res_scal = opt_flag.is_some().then(|| opt(&mut c, |c| c.i1())).flatten();
        let _llm_scal = res_scal.is_some().then(|| opt(&mut c, |c| c.i1())).flatten();
        let _hlm_scal = _llm_scal.is_some().then(|| opt(&mut c, |c| c.i1())).flatten();
        let lo_limit = _hlm_scal
            .is_some()
            .then(|| opt(&mut c, |c| c.r4(endian)))
            .flatten();
        let hi_limit = lo_limit.is_some().then(|| opt(&mut c, |c| c.r4(endian))).flatten();
        let _start_in = hi_limit.is_some().then(|| opt(&mut c, |c| c.r4(endian))).flatten();
        let _incr_in = _start_in
            .is_some()
            .then(|| opt(&mut c, |c| c.r4(endian)))
            .flatten();
        let rtn_indx_cnt = _incr_in.is_some().then(|| opt(&mut c, |c| c.u2(endian))).flatten();
        let units = if let Some(n) = rtn_indx_cnt {
            if c.kxu2(n as usize, endian).is_ok() {
                opt(&mut c, |c| c.cn())
            } else {
                None
            }
        } else {
            None
        };

        Ok(Self {
            header: TestHeader {
                test_num,
                head_num,
                site_num,
                test_flg,
            },
            meta: TestMeta {
                test_txt,
                res_scal,
                lo_limit,
                hi_limit,
                units,
                opt_flag,
            },
        })
    }
}

/// FTR — Functional Test Record. `TEST_TXT` is the only `TestMeta` field
/// it contributes; scale/limits/units are emitted as NULL/""/0 by the
/// handler regardless of what FTR carries (spec §4.3).
#[derive(Debug, Clone, PartialEq)]
pub struct Ftr {
    pub header: TestHeader,
    pub test_txt: Option<String>,
}

impl Ftr {
    pub fn decode(bytes: &[u8], endian: Endian) -> Result<Self, CodecError> {
        let mut c = Cursor::new(bytes);
        let test_num = c.u4(endian)?;
        let head_num = c.u1()?;
        let site_num = c.u1()?;
        let test_flg = c.u1()?;
        let opt_flag = opt(&mut c, |c| c.u1());
        let cycl_cnt = opt_flag.and(opt(&mut c, |c| c.u4(endian)));
        let rel_vadr = cycl_cnt.and(opt(&mut c, |c| c.u4(endian)));
        let rept_cnt = rel_vadr.and(opt(&mut c, |c| c.u4(endian)));
        let num_fail = rept_cnt.and(opt(&mut c, |c| c.u4(endian)));
        let xfail_ad = num_fail.and(opt(&mut c, |c| c.i4(endian)));
        let yfail_ad = xfail_ad.and(opt(&mut c, |c| c.i4(endian)));
        let vect_off = yfail_ad.and(opt(&mut c, |c| c.i2(endian)));
        let rtn_icnt = vect_off.and(opt(&mut c, |c| c.u2(endian)));
        let pgm_icnt = rtn_icnt.and(opt(&mut c, |c| c.u2(endian)));

        let mut after_arrays = pgm_icnt.is_some();
        if let (Some(j), Some(k)) = (rtn_icnt, pgm_icnt) {
            let ok = c.kxu2(j as usize, endian).is_ok()
                && c.kxu1(j as usize).is_ok()
                && c.kxu2(k as usize, endian).is_ok()
                && c.kxu1(k as usize).is_ok()
                && c.bn().is_ok();
            after_arrays = ok;
        }

        let vect_nam = after_arrays.then(|| opt(&mut c, |c| c.cn())).flatten();
        let time_set = vect_nam.is_some().then(|| opt(&mut c, |c| c.cn())).flatten();
        let op_code = time_set.is_some().then(|| opt(&mut c, |c| c.cn())).flatten();
        let test_txt = op_code.is_some().then(|| opt(&mut c, |c| c.cn())).flatten();

        Ok(Self {
            header: TestHeader {
                test_num,
                head_num,
                site_num,
                test_flg,
            },
            test_txt,
        })
    }
}

/// TSR — Test Synopsis Record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tsr {
    pub test_num: u32,
    pub fail_cnt: u32,
}

impl Tsr {
    pub fn decode(bytes: &[u8], endian: Endian) -> Result<Self, CodecError> {
        let mut c = Cursor::new(bytes);
        let _head_num = c.u1()?;
        let _site_num = c.u1()?;
        let _test_typ = c.u1()?;
        let test_num = c.u4(endian)?;
        let _exec_cnt = c.u4(endian)?;
        let fail_cnt = c.u4(endian)?;

        Ok(Self { test_num, fail_cnt })
    }
}

/// HBR/SBR — Hard/Soft Bin Records. Layout is identical; `bin_type`
/// distinguishes which `Bin_Info.BIN_TYPE` row to upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct BinRecord {
    pub bin_num: u16,
    pub bin_pf: Option<u8>,
    pub bin_nam: Option<String>,
}

impl BinRecord {
    pub fn decode(bytes: &[u8], endian: Endian) -> Result<Self, CodecError> {
        let mut c = Cursor::new(bytes);
        let _head_num = c.u1()?;
        let _site_num = c.u1()?;
        let bin_num = c.u2(endian)?;
        let bin_cnt = opt(&mut c, |c| c.u4(endian));
        let bin_pf = bin_cnt.and(opt(&mut c, |c| c.u1()));
        let bin_nam = bin_pf.is_some().then(|| opt(&mut c, |c| c.cn())).flatten();

        Ok(Self {
            bin_num,
            bin_pf,
            bin_nam,
        })
    }

    /// Which `record_codes` constant a decoded instance came from — callers
    /// pick the `BIN_TYPE` character, `"H"` or `"S"`, from the record code.
    pub fn bin_type_char(code: u16) -> char {
        if code == record_codes::HBR { 'H' } else { 'S' }
    }
}

/// WIR — Wafer Information Record.
#[derive(Debug, Clone, PartialEq)]
pub struct Wir {
    pub head_num: u8,
    pub wafer_id: Option<String>,
}

impl Wir {
    pub fn decode(bytes: &[u8], endian: Endian) -> Result<Self, CodecError> {
        let mut c = Cursor::new(bytes);
        let head_num = c.u1()?;
        let site_grp = opt(&mut c, |c| c.u1());
        let start_t = site_grp.and(opt(&mut c, |c| c.u4(endian)));
        let wafer_id = start_t.and(opt(&mut c, |c| c.cn()));

        Ok(Self { head_num, wafer_id })
    }
}

/// WRR — Wafer Results Record.
#[derive(Debug, Clone, PartialEq)]
pub struct Wrr {
    pub head_num: u8,
    pub part_cnt: u32,
    pub rtst_cnt: Option<u32>,
    pub abrt_cnt: Option<u32>,
    pub good_cnt: Option<u32>,
    pub func_cnt: Option<u32>,
    pub wafer_id: Option<String>,
    pub fabwf_id: Option<String>,
    pub frame_id: Option<String>,
    pub mask_id: Option<String>,
    pub usr_desc: Option<String>,
    pub exc_desc: Option<String>,
}

impl Wrr {
    pub fn decode(bytes: &[u8], endian: Endian) -> Result<Self, CodecError> {
        let mut c = Cursor::new(bytes);
        let head_num = c.u1()?;
        let _site_grp = c.u1()?;
        let _finish_t = c.u4(endian)?;
        let part_cnt = c.u4(endian)?;
        let rtst_cnt = opt(&mut c, |c| c.u4(endian));
        let abrt_cnt = rtst_cnt.and(opt(&mut c, |c| c.u4(endian)));
        let good_cnt = abrt_cnt.and(opt(&mut c, |c| c.u4(endian)));
        let func_cnt = good_cnt.and(opt(&mut c, |c| c.u4(endian)));
        let wafer_id = func_cnt.is_some().then(|| opt(&mut c, |c| c.cn())).flatten();
        let fabwf_id = wafer_id.is_some().then(|| opt(&mut c, |c| c.cn())).flatten();
        let frame_id = fabwf_id.is_some().then(|| opt(&mut c, |c| c.cn())).flatten();
        let mask_id = frame_id.is_some().then(|| opt(&mut c, |c| c.cn())).flatten();
        let usr_desc = mask_id.is_some().then(|| opt(&mut c, |c| c.cn())).flatten();
        let exc_desc = usr_desc.is_some().then(|| opt(&mut c, |c| c.cn())).flatten();

        Ok(Self {
            head_num,
            part_cnt,
            rtst_cnt,
            abrt_cnt,
            good_cnt,
            func_cnt,
            wafer_id,
            fabwf_id,
            frame_id,
            mask_id,
            usr_desc,
            exc_desc,
        })
    }
}

/// WCR — Wafer Configuration Record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wcr {
    pub wafr_siz: f32,
    pub die_ht: f32,
    pub die_wid: f32,
    pub wf_units: u8,
    pub wf_flat: Option<u8>,
    pub center_x: Option<i16>,
    pub center_y: Option<i16>,
    pub pos_x: Option<u8>,
    pub pos_y: Option<u8>,
}

impl Wcr {
    pub fn decode(bytes: &[u8], endian: Endian) -> Result<Self, CodecError> {
        let mut c = Cursor::new(bytes);
        let wafr_siz = c.r4(endian)?;
        let die_ht = c.r4(endian)?;
        let die_wid = c.r4(endian)?;
        let wf_units = c.u1()?;
        let wf_flat = opt(&mut c, |c| c.u1());
        let center_x = wf_flat.and(opt(&mut c, |c| c.i2(endian)));
        let center_y = center_x.and(opt(&mut c, |c| c.i2(endian)));
        let pos_x = center_y.is_some().then(|| opt(&mut c, |c| c.u1())).flatten();
        let pos_y = pos_x.is_some().then(|| opt(&mut c, |c| c.u1())).flatten();

        Ok(Self {
            wafr_siz,
            die_ht,
            die_wid,
            wf_units,
            wf_flat,
            center_x,
            center_y,
            pos_x,
            pos_y,
        })
    }
}

/// PCR — Part Count Record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pcr {
    pub head_num: u8,
    pub site_num: u8,
    pub part_cnt: u32,
    pub rtst_cnt: u32,
    pub abrt_cnt: u32,
    pub good_cnt: u32,
    pub func_cnt: u32,
}

impl Pcr {
    pub fn decode(bytes: &[u8], endian: Endian) -> Result<Self, CodecError> {
        let mut c = Cursor::new(bytes);
        Ok(Self {
            head_num: c.u1()?,
            site_num: c.u1()?,
            part_cnt: c.u4(endian)?,
            rtst_cnt: c.u4(endian)?,
            abrt_cnt: c.u4(endian)?,
            good_cnt: c.u4(endian)?,
            func_cnt: c.u4(endian)?,
        })
    }
}

/// One decoded record, tagged by which STDF type produced it. The
/// dispatch table in `summarize::dispatch` matches on this to pick a
/// handler, then destructures the variant it expects.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedRecord {
    Mir(Mir),
    Pmr(Pmr),
    Pir(Pir),
    Prr(Prr),
    Ptr(Ptr),
    Mpr(Mpr),
    Ftr(Ftr),
    Tsr(Tsr),
    Hbr(BinRecord),
    Sbr(BinRecord),
    Wir(Wir),
    Wrr(Wrr),
    Wcr(Wcr),
    Pcr(Pcr),
}

/// Decodes `bytes` according to `record_code`, the composite code
/// computed from a record's header. Only the fourteen codes the reader
/// thread enqueues (spec §3.1) have decoders; anything else is
/// [`CodecError::UnsupportedRecordCode`].
pub fn decode(record_code: u16, bytes: &[u8], endian: Endian) -> Result<TypedRecord, CodecError> {
    use record_codes::*;

    Ok(match record_code {
        MIR => TypedRecord::Mir(Mir::decode(bytes, endian)?),
        PMR => TypedRecord::Pmr(Pmr::decode(bytes, endian)?),
        PIR => TypedRecord::Pir(Pir::decode(bytes)?),
        PRR => TypedRecord::Prr(Prr::decode(bytes, endian)?),
        PTR => TypedRecord::Ptr(Ptr::decode(bytes, endian)?),
        MPR => TypedRecord::Mpr(Mpr::decode(bytes, endian)?),
        FTR => TypedRecord::Ftr(Ftr::decode(bytes, endian)?),
        TSR => TypedRecord::Tsr(Tsr::decode(bytes, endian)?),
        HBR => TypedRecord::Hbr(BinRecord::decode(bytes, endian)?),
        SBR => TypedRecord::Sbr(BinRecord::decode(bytes, endian)?),
        WIR => TypedRecord::Wir(Wir::decode(bytes, endian)?),
        WRR => TypedRecord::Wrr(Wrr::decode(bytes, endian)?),
        WCR => TypedRecord::Wcr(Wcr::decode(bytes, endian)?),
        PCR => TypedRecord::Pcr(Pcr::decode(bytes, endian)?),
        other => return Err(CodecError::UnsupportedRecordCode(other)),
    })
}

/// Runs `f` only if the cursor has bytes remaining, treating an
/// exhausted payload as "trailing optional field omitted" rather than
/// an error. A read error is also folded into `None` so that strict
/// STDF writers that drop a field's trailing padding don't abort
/// decoding of the whole record.
fn opt<'a, T>(c: &mut Cursor<'a>, f: impl FnOnce(&mut Cursor<'a>) -> Result<T, CodecError>) -> Option<T> {
    if !c.has_more() {
        return None;
    }
    f(c).ok()
}
