// ==========================================
// 社員名簿同期システム - 行解釈器
// ==========================================
// 責務: 原始行レコード（HashMap<列名, 値>）→ ProcessedEmployee 変換
// - 列名エイリアス対応のヘッダ参照
// - 所属文字列の階層分解（位置ベース: 部 課 係 の順を仮定）
// - 明示列（課 / 係）が非空なら位置分解より優先
// ==========================================

use crate::config::ReconcileConfig;
use crate::domain::employee::ProcessedEmployee;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::normalizer;
use std::collections::HashMap;

// ==========================================
// AffiliationPath - 所属分解結果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffiliationPath {
    pub department: String,
    pub section: Option<String>,
    pub course: Option<String>,
}

/// 所属文字列を階層に分解する
///
/// # 規則（位置ベース分解）
/// - 空白（半角・全角とも）の連続で区切る
/// - トークン1 = 部、トークン2 = 課、トークン3 = 係
/// - トークン4以降は係名に空白連結で畳み込む
/// - 空文字列は None
///
/// 意味解析ではなく位置分解であり、供給元が常に部→課→係の順で
/// 出力することを前提とする
pub fn parse_affiliation(text: &str) -> Option<AffiliationPath> {
    // char::is_whitespace は全角空白 U+3000 を含む
    let tokens: Vec<&str> = text.split_whitespace().collect();

    match tokens.as_slice() {
        [] => None,
        [dept] => Some(AffiliationPath {
            department: dept.to_string(),
            section: None,
            course: None,
        }),
        [dept, section] => Some(AffiliationPath {
            department: dept.to_string(),
            section: Some(section.to_string()),
            course: None,
        }),
        [dept, section, rest @ ..] => Some(AffiliationPath {
            department: dept.to_string(),
            section: Some(section.to_string()),
            course: Some(rest.join(" ")),
        }),
    }
}

// ==========================================
// RowParser - 行解釈器
// ==========================================
pub struct RowParser {
    default_position_name: String,
}

impl RowParser {
    pub fn new(config: &ReconcileConfig) -> Self {
        Self {
            default_position_name: config.default_position_name.clone(),
        }
    }

    /// 原始行を ProcessedEmployee へ変換する
    ///
    /// # 引数
    /// - `row`: 原始行レコード（HashMap<列名, 値>）
    /// - `row_number`: 行番号（エラー報告用）
    ///
    /// # 戻り値
    /// - Ok(ProcessedEmployee): 変換成功
    /// - Err: 必須項目（社員番号・氏名・所属）の欠損
    ///
    /// # 説明
    /// 必須項目が欠けた行はエラーとして報告され、リコンサイルの前に
    /// 除外される（他の行の処理は継続する）
    pub fn process_row(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
    ) -> ImportResult<ProcessedEmployee> {
        // ===== 必須項目 =====
        let employee_number = self
            .get_string(row, "社員番号")
            .ok_or_else(|| ImportError::MissingRequiredField {
                row: row_number,
                field: "社員番号".to_string(),
            })?;

        let name = self
            .get_string(row, "氏名")
            .ok_or_else(|| ImportError::MissingRequiredField {
                row: row_number,
                field: "氏名".to_string(),
            })?;

        let affiliation_text = self
            .get_string(row, "所属")
            .ok_or_else(|| ImportError::MissingRequiredField {
                row: row_number,
                field: "所属".to_string(),
            })?;

        let path = parse_affiliation(&affiliation_text).ok_or_else(|| {
            ImportError::MissingRequiredField {
                row: row_number,
                field: "所属".to_string(),
            }
        })?;

        // ===== 明示列による上書き =====
        // 課 / 係 列が非空の場合は位置分解より優先する
        let section_name = self.get_string(row, "課").or(path.section);
        let course_name = self.get_string(row, "係").or(path.course);

        // ===== 役職（欠損時は既定値を補完）=====
        let position_name = self
            .get_string(row, "役職")
            .unwrap_or_else(|| self.default_position_name.clone());

        Ok(ProcessedEmployee {
            employee_number,
            name,
            department_name: path.department,
            section_name,
            course_name,
            affiliation_code: self.get_string(row, "所属コード"),
            name_kana: self
                .get_string(row, "フリガナ")
                .map(|v| normalizer::to_full_width_kana(&v)),
            email: self.get_string(row, "メールアドレス"),
            phone: self.get_string(row, "電話番号"),
            position_name,
            position_code: self.get_string(row, "役職コード"),
            grade_name: self.get_string(row, "資格等級"),
            grade_code: self.get_string(row, "等級コード"),
            employment_type_name: self.get_string(row, "雇用区分"),
            employment_type_code: self.get_string(row, "雇用区分コード"),
            joined_on: self
                .get_string(row, "入社日")
                .and_then(|v| normalizer::parse_date(&v)),
            birth_date: self
                .get_string(row, "生年月日")
                .and_then(|v| normalizer::parse_date(&v)),
            row_number,
        })
    }

    /// 文字列項目の取得（列名エイリアス対応、空欄は None）
    fn get_string(&self, row: &HashMap<String, String>, key: &str) -> Option<String> {
        // 列名エイリアス表
        let aliases: Vec<&str> = match key {
            "社員番号" => vec!["社員番号", "従業員番号"],
            "氏名" => vec!["氏名", "社員氏名", "名前"],
            "フリガナ" => vec!["フリガナ", "カナ氏名", "ﾌﾘｶﾞﾅ"],
            "メールアドレス" => vec!["メールアドレス", "メール", "Email"],
            "電話番号" => vec!["電話番号", "電話"],
            "所属" => vec!["所属", "所属部署", "部署"],
            "所属コード" => vec!["所属コード", "部署コード"],
            "課" => vec!["課", "課名"],
            "係" => vec!["係", "係名"],
            "役職" => vec!["役職", "役職名"],
            "資格等級" => vec!["資格等級", "等級"],
            "等級コード" => vec!["等級コード", "資格等級コード"],
            "雇用区分" => vec!["雇用区分", "雇用形態"],
            "入社日" => vec!["入社日", "入社年月日"],
            _ => vec![key],
        };

        for alias in aliases {
            if let Some(v) = row.get(alias) {
                let trimmed = v.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_parser() -> RowParser {
        RowParser::new(&ReconcileConfig::default())
    }

    fn base_row() -> HashMap<String, String> {
        let mut row = HashMap::new();
        row.insert("社員番号".to_string(), "E001".to_string());
        row.insert("氏名".to_string(), "山田 太郎".to_string());
        row.insert("所属".to_string(), "営業部 第一課 販売係".to_string());
        row
    }

    #[test]
    fn test_parse_affiliation_three_tokens() {
        let path = parse_affiliation("営業部 第一課 販売係").unwrap();
        assert_eq!(path.department, "営業部");
        assert_eq!(path.section.as_deref(), Some("第一課"));
        assert_eq!(path.course.as_deref(), Some("販売係"));
    }

    #[test]
    fn test_parse_affiliation_full_width_space() {
        let path = parse_affiliation("営業部　第一課").unwrap();
        assert_eq!(path.department, "営業部");
        assert_eq!(path.section.as_deref(), Some("第一課"));
        assert_eq!(path.course, None);
    }

    #[test]
    fn test_parse_affiliation_single_token() {
        let path = parse_affiliation("総務部").unwrap();
        assert_eq!(path.department, "総務部");
        assert_eq!(path.section, None);
        assert_eq!(path.course, None);
    }

    #[test]
    fn test_parse_affiliation_four_plus_tokens_fold_into_course() {
        // 4トークン目以降は係名へ畳み込む（明示的な契約）
        let path = parse_affiliation("営業部 第一課 販売係 東京 駐在").unwrap();
        assert_eq!(path.department, "営業部");
        assert_eq!(path.section.as_deref(), Some("第一課"));
        assert_eq!(path.course.as_deref(), Some("販売係 東京 駐在"));
    }

    #[test]
    fn test_parse_affiliation_empty() {
        assert_eq!(parse_affiliation(""), None);
        assert_eq!(parse_affiliation("   "), None);
    }

    #[test]
    fn test_process_row_basic() {
        let parser = make_parser();
        let record = parser.process_row(&base_row(), 1).unwrap();

        assert_eq!(record.employee_number, "E001");
        assert_eq!(record.name, "山田 太郎");
        assert_eq!(record.department_name, "営業部");
        assert_eq!(record.section_name.as_deref(), Some("第一課"));
        assert_eq!(record.course_name.as_deref(), Some("販売係"));
        // 役職欠損時は既定値を補完
        assert_eq!(record.position_name, "一般社員");
    }

    #[test]
    fn test_process_row_missing_employee_number() {
        let parser = make_parser();
        let mut row = base_row();
        row.insert("社員番号".to_string(), "".to_string());

        let result = parser.process_row(&row, 3);
        match result {
            Err(ImportError::MissingRequiredField { row, field }) => {
                assert_eq!(row, 3);
                assert_eq!(field, "社員番号");
            }
            other => panic!("期待外の結果: {:?}", other.map(|r| r.employee_number)),
        }
    }

    #[test]
    fn test_process_row_explicit_columns_override() {
        let parser = make_parser();
        let mut row = base_row();
        row.insert("課".to_string(), "海外営業課".to_string());
        row.insert("係".to_string(), "輸出係".to_string());

        let record = parser.process_row(&row, 1).unwrap();
        assert_eq!(record.section_name.as_deref(), Some("海外営業課"));
        assert_eq!(record.course_name.as_deref(), Some("輸出係"));
    }

    #[test]
    fn test_process_row_kana_normalized() {
        let parser = make_parser();
        let mut row = base_row();
        row.insert("フリガナ".to_string(), "ﾔﾏﾀﾞ ﾀﾛｳ".to_string());

        let record = parser.process_row(&row, 1).unwrap();
        assert_eq!(record.name_kana.as_deref(), Some("ヤマダ タロウ"));
    }

    #[test]
    fn test_process_row_dates_parsed() {
        let parser = make_parser();
        let mut row = base_row();
        row.insert("入社日".to_string(), "R5.4.1".to_string());
        row.insert("生年月日".to_string(), "1990/6/15".to_string());

        let record = parser.process_row(&row, 1).unwrap();
        assert_eq!(record.joined_on, Some(NaiveDate::from_ymd_opt(2023, 4, 1).unwrap()));
        assert_eq!(record.birth_date, Some(NaiveDate::from_ymd_opt(1990, 6, 15).unwrap()));
    }

    #[test]
    fn test_process_row_bad_date_left_absent() {
        // 不正な日付は行を落とさず欠損扱い
        let parser = make_parser();
        let mut row = base_row();
        row.insert("入社日".to_string(), "昔".to_string());

        let record = parser.process_row(&row, 1).unwrap();
        assert_eq!(record.joined_on, None);
    }

    #[test]
    fn test_process_row_alias_columns() {
        let parser = make_parser();
        let mut row = HashMap::new();
        row.insert("従業員番号".to_string(), "E010".to_string());
        row.insert("名前".to_string(), "佐藤 花子".to_string());
        row.insert("部署".to_string(), "総務部".to_string());

        let record = parser.process_row(&row, 1).unwrap();
        assert_eq!(record.employee_number, "E010");
        assert_eq!(record.name, "佐藤 花子");
        assert_eq!(record.department_name, "総務部");
    }
}
