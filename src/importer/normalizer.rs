// ==========================================
// 社員名簿同期システム - 正規化ユーティリティ
// ==========================================
// 責務: セル文字列の正準化（純粋関数のみ）
// - 日付解釈: 表計算シリアル値 / 和暦 / 年月日表記 / スラッシュ・ハイフン区切り
// - 半角カナ → 全角カナ変換（濁点・半濁点ペア優先）
// ==========================================

use chrono::{Datelike, Duration, NaiveDate};

/// シリアル値の基準日（1899-12-30 起点の慣行）
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// シリアル値として受理する西暦年の範囲
const SERIAL_YEAR_MIN: i32 = 1900;
const SERIAL_YEAR_MAX: i32 = 2100;

// ==========================================
// 日付解釈
// ==========================================

/// 多形式の日付文字列を解釈する
///
/// # 解釈順序
/// 1. 5桁シリアル値（1899-12-30 起点。1900〜2100年の範囲外は棄却）
/// 2. 和暦表記 `<元号><年>.<月>.<日>`（R=令和, H=平成, S=昭和。漢字元号も可）
/// 3. 漢字表記 `<年>年<月>月<日>日`
/// 4. `YYYY/M/D` / `YYYY-M-D`
///
/// # 戻り値
/// - Some(NaiveDate): 解釈成功
/// - None: 空欄または未知の形式（エラーにはしない。1件の不正日付で
///   行全体を落とさないため）
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    parse_spreadsheet_serial(value)
        .or_else(|| parse_japanese_era(value))
        .or_else(|| parse_kanji_date(value))
        .or_else(|| parse_slash_or_dash(value))
}

/// 5桁シリアル値の解釈
///
/// 5桁の数字列のみ対象。基準日に日数を加算し、結果が 1900〜2100 年の
/// 範囲に収まる場合だけ受理する（範囲外は黙って誤解釈せず棄却）
fn parse_spreadsheet_serial(value: &str) -> Option<NaiveDate> {
    if value.len() != 5 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let serial: i64 = value.parse().ok()?;

    let (y, m, d) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    let date = epoch.checked_add_signed(Duration::days(serial))?;

    if (SERIAL_YEAR_MIN..=SERIAL_YEAR_MAX).contains(&date.year()) {
        Some(date)
    } else {
        None
    }
}

/// 元号プレフィックスと西暦換算オフセット
///
/// 換算: 西暦年 = 元号年 + オフセット（令和5年 → 2018 + 5 = 2023）
fn era_offset(value: &str) -> Option<(usize, i32)> {
    const ERAS: [(&str, i32); 6] = [
        ("令和", 2018),
        ("平成", 1988),
        ("昭和", 1925),
        ("R", 2018),
        ("H", 1988),
        ("S", 1925),
    ];
    for (prefix, offset) in ERAS {
        if value.starts_with(prefix) {
            return Some((prefix.len(), offset));
        }
    }
    None
}

/// 和暦表記 `<元号><年>.<月>.<日>` の解釈
fn parse_japanese_era(value: &str) -> Option<NaiveDate> {
    let (prefix_len, offset) = era_offset(value)?;
    let rest = &value[prefix_len..];

    let mut parts = rest.split('.');
    let era_year: i32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let day: u32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || era_year < 1 {
        return None;
    }

    NaiveDate::from_ymd_opt(offset + era_year, month, day)
}

/// 漢字表記 `<年>年<月>月<日>日` の解釈
fn parse_kanji_date(value: &str) -> Option<NaiveDate> {
    let (year_part, rest) = value.split_once('年')?;
    let (month_part, rest) = rest.split_once('月')?;
    let (day_part, rest) = rest.split_once('日')?;
    if !rest.trim().is_empty() {
        return None;
    }

    let year: i32 = year_part.trim().parse().ok()?;
    let month: u32 = month_part.trim().parse().ok()?;
    let day: u32 = day_part.trim().parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// `YYYY/M/D` / `YYYY-M-D` の解釈
fn parse_slash_or_dash(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y/%m/%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .ok()
}

// ==========================================
// 半角カナ → 全角カナ変換
// ==========================================

/// 濁点付き2文字シーケンス（基底 + ﾞ）の変換表
fn voiced(base: char) -> Option<char> {
    let converted = match base {
        'ｶ' => 'ガ', 'ｷ' => 'ギ', 'ｸ' => 'グ', 'ｹ' => 'ゲ', 'ｺ' => 'ゴ',
        'ｻ' => 'ザ', 'ｼ' => 'ジ', 'ｽ' => 'ズ', 'ｾ' => 'ゼ', 'ｿ' => 'ゾ',
        'ﾀ' => 'ダ', 'ﾁ' => 'ヂ', 'ﾂ' => 'ヅ', 'ﾃ' => 'デ', 'ﾄ' => 'ド',
        'ﾊ' => 'バ', 'ﾋ' => 'ビ', 'ﾌ' => 'ブ', 'ﾍ' => 'ベ', 'ﾎ' => 'ボ',
        'ｳ' => 'ヴ',
        _ => return None,
    };
    Some(converted)
}

/// 半濁点付き2文字シーケンス（基底 + ﾟ）の変換表
fn semi_voiced(base: char) -> Option<char> {
    let converted = match base {
        'ﾊ' => 'パ', 'ﾋ' => 'ピ', 'ﾌ' => 'プ', 'ﾍ' => 'ペ', 'ﾎ' => 'ポ',
        _ => return None,
    };
    Some(converted)
}

/// 単独半角カナの変換表
fn single(c: char) -> Option<char> {
    let converted = match c {
        'ｱ' => 'ア', 'ｲ' => 'イ', 'ｳ' => 'ウ', 'ｴ' => 'エ', 'ｵ' => 'オ',
        'ｶ' => 'カ', 'ｷ' => 'キ', 'ｸ' => 'ク', 'ｹ' => 'ケ', 'ｺ' => 'コ',
        'ｻ' => 'サ', 'ｼ' => 'シ', 'ｽ' => 'ス', 'ｾ' => 'セ', 'ｿ' => 'ソ',
        'ﾀ' => 'タ', 'ﾁ' => 'チ', 'ﾂ' => 'ツ', 'ﾃ' => 'テ', 'ﾄ' => 'ト',
        'ﾅ' => 'ナ', 'ﾆ' => 'ニ', 'ﾇ' => 'ヌ', 'ﾈ' => 'ネ', 'ﾉ' => 'ノ',
        'ﾊ' => 'ハ', 'ﾋ' => 'ヒ', 'ﾌ' => 'フ', 'ﾍ' => 'ヘ', 'ﾎ' => 'ホ',
        'ﾏ' => 'マ', 'ﾐ' => 'ミ', 'ﾑ' => 'ム', 'ﾒ' => 'メ', 'ﾓ' => 'モ',
        'ﾔ' => 'ヤ', 'ﾕ' => 'ユ', 'ﾖ' => 'ヨ',
        'ﾗ' => 'ラ', 'ﾘ' => 'リ', 'ﾙ' => 'ル', 'ﾚ' => 'レ', 'ﾛ' => 'ロ',
        'ﾜ' => 'ワ', 'ｦ' => 'ヲ', 'ﾝ' => 'ン',
        'ｧ' => 'ァ', 'ｨ' => 'ィ', 'ｩ' => 'ゥ', 'ｪ' => 'ェ', 'ｫ' => 'ォ',
        'ｬ' => 'ャ', 'ｭ' => 'ュ', 'ｮ' => 'ョ', 'ｯ' => 'ッ',
        'ｰ' => 'ー', '｡' => '。', '｢' => '「', '｣' => '」', '､' => '、', '･' => '・',
        'ﾞ' => '゛', 'ﾟ' => '゜',
        _ => return None,
    };
    Some(converted)
}

/// 半角カナを全角カナへ変換する
///
/// 濁点・半濁点の2文字シーケンスを単独文字より先に置換するため、
/// 有声ペアが全角2文字に分断されることはない。
/// 半角カナ以外の文字はそのまま通す
pub fn to_full_width_kana(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match chars.peek() {
            Some('ﾞ') => {
                if let Some(v) = voiced(c) {
                    result.push(v);
                    chars.next();
                    continue;
                }
            }
            Some('ﾟ') => {
                if let Some(v) = semi_voiced(c) {
                    result.push(v);
                    chars.next();
                    continue;
                }
            }
            _ => {}
        }
        result.push(single(c).unwrap_or(c));
    }

    result
}
