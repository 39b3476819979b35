//! 会话令牌生成

use rand::RngCore;
use rand::rngs::OsRng;
use std::fmt::Write;

/// 令牌字节数，十六进制编码后为 32 个字符
pub const TOKEN_BYTES: usize = 16;

/// 令牌长度（字符）
pub const TOKEN_LEN: usize = TOKEN_BYTES * 2;

/// 生成会话令牌
///
/// 使用操作系统提供的密码学安全随机源
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);

    let mut token = String::with_capacity(TOKEN_LEN);
    for byte in bytes {
        // 写入 String 不会失败
        let _ = write!(token, "{:02x}", byte);
    }
    token
}

/// 检查字符串是否符合令牌格式
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
