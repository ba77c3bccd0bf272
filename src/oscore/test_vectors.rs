// RFC 8613, Appendix C.1 (test vector 1, with master salt) and C.4
pub const MASTER_SECRET: [u8; 16] = [
    0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C,
    0x0D, 0x0E, 0x0F, 0x10,
];
pub const MASTER_SALT: [u8; 8] =
    [0x9E, 0x7C, 0xA9, 0x22, 0x23, 0x78, 0x63, 0x40];
pub const CLIENT_ID: [u8; 0] = [];
pub const SERVER_ID: [u8; 1] = [0x01];

pub const INFO_CLIENT_KEY: [u8; 9] =
    [0x85, 0x40, 0xF6, 0x0A, 0x63, 0x4B, 0x65, 0x79, 0x10];
pub const INFO_SERVER_KEY: [u8; 10] =
    [0x85, 0x41, 0x01, 0xF6, 0x0A, 0x63, 0x4B, 0x65, 0x79, 0x10];
pub const INFO_COMMON_IV: [u8; 8] =
    [0x85, 0x40, 0xF6, 0x0A, 0x62, 0x49, 0x56, 0x0D];

pub const CLIENT_KEY: [u8; 16] = [
    0xF0, 0x91, 0x0E, 0xD7, 0x29, 0x5E, 0x6A, 0xD4, 0xB5, 0x4F, 0xC7, 0x93,
    0x15, 0x43, 0x02, 0xFF,
];
pub const SERVER_KEY: [u8; 16] = [
    0xFF, 0xB1, 0x4E, 0x09, 0x3C, 0x94, 0xC9, 0xCA, 0xC9, 0x47, 0x16, 0x48,
    0xB4, 0xF9, 0x87, 0x10,
];
pub const COMMON_IV: [u8; 13] = [
    0x46, 0x22, 0xD4, 0xDD, 0x6D, 0x94, 0x41, 0x68, 0xEE, 0xFB, 0x54, 0x98,
    0x7C,
];

// Same inputs, HKDF-SHA-512
pub const CLIENT_KEY_SHA512: [u8; 16] = [
    0xCB, 0x7F, 0x4A, 0x1E, 0xCF, 0x94, 0x23, 0xBB, 0x47, 0x02, 0x62, 0xEC,
    0x67, 0x03, 0x02, 0xDC,
];
pub const COMMON_IV_SHA512: [u8; 13] = [
    0x61, 0xBB, 0x6F, 0x71, 0x45, 0xBE, 0xE3, 0xEE, 0xE8, 0xCE, 0xC8, 0x1D,
    0x12,
];

// Same inputs, A256GCM
pub const CLIENT_KEY_GCM: [u8; 32] = [
    0x5A, 0x82, 0x8C, 0xDC, 0x2D, 0x3B, 0xFE, 0x69, 0x9B, 0x2E, 0xE6, 0xA9,
    0x07, 0x0C, 0xED, 0xF9, 0x7A, 0xD2, 0x83, 0x55, 0x23, 0xC1, 0x7E, 0x2C,
    0xD8, 0x08, 0xEF, 0x84, 0x25, 0xB3, 0x19, 0xCE,
];
pub const COMMON_IV_GCM: [u8; 12] = [
    0x15, 0xAC, 0x68, 0xBC, 0xCB, 0x2D, 0x1B, 0x04, 0x92, 0x19, 0x39, 0x3B,
];

// Request with sender sequence number 20
pub const REQ_SSN: u64 = 20;
pub const REQ_PIV: [u8; 1] = [0x14];
pub const REQ_AAD_ARR: [u8; 8] =
    [0x85, 0x01, 0x81, 0x0A, 0x40, 0x41, 0x14, 0x40];
pub const REQ_AAD: [u8; 20] = [
    0x83, 0x68, 0x45, 0x6E, 0x63, 0x72, 0x79, 0x70, 0x74, 0x30, 0x40, 0x48,
    0x85, 0x01, 0x81, 0x0A, 0x40, 0x41, 0x14, 0x40,
];
pub const CLIENT_NONCE: [u8; 13] = [
    0x46, 0x22, 0xD4, 0xDD, 0x6D, 0x94, 0x41, 0x68, 0xEE, 0xFB, 0x54, 0x98,
    0x68,
];
pub const SERVER_NONCE: [u8; 13] = [
    0x47, 0x22, 0xD4, 0xDD, 0x6D, 0x94, 0x41, 0x69, 0xEE, 0xFB, 0x54, 0x98,
    0x68,
];

// RFC 8613, Appendix C.2 inputs (no master salt) with sender 0x01 and
// recipient 0x02
pub const PEER_SENDER_ID: [u8; 1] = [0x01];
pub const PEER_RECIPIENT_ID: [u8; 1] = [0x02];
pub const PEER_SENDER_KEY: [u8; 16] = [
    0xE5, 0x7B, 0x56, 0x35, 0x81, 0x51, 0x77, 0xCD, 0x67, 0x9A, 0xB4, 0xBC,
    0xEC, 0x9D, 0x7D, 0xDA,
];
pub const PEER_RECIPIENT_KEY: [u8; 16] = [
    0xF9, 0x5E, 0xB0, 0x4F, 0x9C, 0x43, 0x00, 0xDF, 0x52, 0x1E, 0x8D, 0xC8,
    0xA4, 0x58, 0x78, 0x5D,
];
pub const PEER_COMMON_IV: [u8; 13] = [
    0xBE, 0x35, 0xAE, 0x29, 0x7D, 0x2D, 0xAC, 0xE9, 0x10, 0xC5, 0x2E, 0x99,
    0xF9,
];
