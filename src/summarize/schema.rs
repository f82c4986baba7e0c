//! DDL for the persistent summary schema (§6.4, bit-stable column order).

pub const CREATE_TABLES: &str = "
CREATE TABLE File_Info (
    Field TEXT,
    Value TEXT
);

CREATE TABLE Wafer_Info (
    HEAD_NUM INTEGER,
    WaferIndex INTEGER PRIMARY KEY,
    PART_CNT INTEGER,
    RTST_CNT INTEGER,
    ABRT_CNT INTEGER,
    GOOD_CNT INTEGER,
    FUNC_CNT INTEGER,
    WAFER_ID TEXT,
    FABWF_ID TEXT,
    FRAME_ID TEXT,
    MASK_ID TEXT,
    USR_DESC TEXT,
    EXC_DESC TEXT
);

CREATE TABLE Dut_Info (
    HEAD_NUM INTEGER,
    SITE_NUM INTEGER,
    DUTIndex INTEGER PRIMARY KEY,
    TestCount INTEGER,
    TestTime INTEGER,
    PartID TEXT,
    HBIN INTEGER,
    SBIN INTEGER,
    Flag INTEGER,
    WaferIndex INTEGER,
    XCOORD INTEGER,
    YCOORD INTEGER
) WITHOUT ROWID;

CREATE TABLE Dut_Counts (
    HEAD_NUM INTEGER,
    SITE_NUM INTEGER,
    PART_CNT INTEGER,
    RTST_CNT INTEGER,
    ABRT_CNT INTEGER,
    GOOD_CNT INTEGER,
    FUNC_CNT INTEGER
);

CREATE TABLE Test_Info (
    TEST_NUM INTEGER PRIMARY KEY,
    recHeader INTEGER,
    TEST_NAME TEXT,
    RES_SCAL INTEGER,
    LLimit REAL,
    HLimit REAL,
    Unit TEXT,
    OPT_FLAG INTEGER,
    FailCount INTEGER
);

CREATE TABLE Test_Offsets (
    DUTIndex INTEGER,
    TEST_NUM INTEGER,
    Offset INTEGER,
    BinaryLen INTEGER,
    PRIMARY KEY (DUTIndex, TEST_NUM)
) WITHOUT ROWID;

CREATE TABLE Bin_Info (
    BIN_TYPE TEXT,
    BIN_NUM INTEGER,
    BIN_NAME TEXT,
    BIN_PF TEXT,
    PRIMARY KEY (BIN_TYPE, BIN_NUM)
);
";
