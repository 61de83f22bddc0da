//! promptpay.rs
//!
//! Генерация строки-пейлоада для QR-кода PromptPay (тайская национальная
//! платёжная система) в формате EMVCo Merchant-Presented QR.
//!
//! Структура пейлоада - последовательность полей `ID(2) + LEN(2) + VALUE`:
//! 1.  **00** - версия формата ("01").
//! 2.  **01** - способ показа: "11" статический QR, "12" динамический (с суммой).
//! 3.  **29** - данные получателя: вложенный AID PromptPay и номер счёта
//!     (телефон в формате 0066XXXXXXXXX, гражданский ID или e-wallet).
//! 4.  **53/54/58** - валюта (764 = THB), сумма, страна.
//! 5.  **63** - CRC-16/CCITT-FALSE от всей строки, 4 hex-символа в верхнем регистре.

/// AID кошелька PromptPay во вложенном поле 29.
const PROMPTPAY_AID: &str = "A000000677010111";

/// Одно поле TLV: ID + длина значения (две цифры) + значение.
fn field(id: &str, value: &str) -> String {
    format!("{}{:02}{}", id, value.len(), value)
}

/// CRC-16/CCITT-FALSE: полином 0x1021, старт 0xFFFF, без отражения.
fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Приводит идентификатор получателя к формату поля 29.
///
/// Телефон "0812345678" превращается в "0066812345678" (под-поле 01),
/// 13-значный гражданский ID остаётся как есть (под-поле 02),
/// 15-значный e-wallet - под-поле 03.
fn account_subfield(promptpay_id: &str) -> String {
    let digits: String = promptpay_id.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        13 => field("02", &digits),
        15 => field("03", &digits),
        _ => {
            let msisdn = format!("0066{}", digits.strip_prefix('0').unwrap_or(&digits));
            field("01", &msisdn)
        }
    }
}

/// Собирает полный пейлоад PromptPay QR. С суммой QR становится динамическим.
pub fn build_payload(promptpay_id: &str, amount: Option<f64>) -> String {
    let merchant_info = format!("{}{}", field("00", PROMPTPAY_AID), account_subfield(promptpay_id));

    let mut payload = String::new();
    payload.push_str(&field("00", "01"));
    payload.push_str(&field("01", if amount.is_some() { "12" } else { "11" }));
    payload.push_str(&field("29", &merchant_info));
    payload.push_str(&field("53", "764"));
    if let Some(amount) = amount {
        payload.push_str(&field("54", &format!("{:.2}", amount)));
    }
    payload.push_str(&field("58", "TH"));

    // CRC считается по строке вместе с заголовком поля 63
    payload.push_str("6304");
    let crc = crc16_ccitt(payload.as_bytes());
    payload.push_str(&format!("{:04X}", crc));
    payload
}
