// ==========================================
// 社員名簿同期システム - 社員領域モデル
// ==========================================
// 鉄則: 社員番号は業務キー（サロゲートキーと別）
// 鉄則: 社員は物理削除しない（active=false で退職化）
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Employee - 社員（永続行）
// ==========================================
// 用途: Committer のみが書き込む。読み取りは EmployeeView を経由する
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    // ===== 主キー =====
    pub employee_id: String,          // サロゲートキー（UUID）
    pub organization_id: String,      // 所属組織

    // ===== 業務キー =====
    pub employee_number: String,      // 社員番号（組織内一意・不変）

    // ===== 基本情報 =====
    pub name: String,                 // 氏名
    pub name_kana: Option<String>,    // フリガナ（全角カナに正規化済）
    pub email: Option<String>,        // メールアドレス
    pub phone: Option<String>,        // 電話番号

    // ===== 役職・等級・雇用 =====
    pub position_name: Option<String>,        // 役職名
    pub position_code: Option<String>,        // 役職コード
    pub grade_name: Option<String>,           // 資格等級名
    pub grade_code: Option<String>,           // 等級コード
    pub employment_type_name: Option<String>, // 雇用区分名
    pub employment_type_code: Option<String>, // 雇用区分コード

    // ===== 日付 =====
    pub joined_on: Option<NaiveDate>,  // 入社日
    pub birth_date: Option<NaiveDate>, // 生年月日

    // ===== 在籍 =====
    pub active: bool,                 // 在籍フラグ（false=退職）

    // ===== 所属参照（部は必須、課・係は任意）=====
    pub department_id: String,
    pub section_id: Option<String>,
    pub course_id: Option<String>,

    // ===== 監査 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// EmployeeView - 読み取り専用 DTO
// ==========================================
// 用途: Reconciler / Committer が参照する「所属名解決済み」のビュー。
//       永続層が常に所属名を埋めて返すため、呼び出し側での
//       リレーション辿りは不要
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeView {
    pub employee_id: String,
    pub employee_number: String,
    pub name: String,
    pub name_kana: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position_name: Option<String>,
    pub position_code: Option<String>,
    pub grade_name: Option<String>,
    pub grade_code: Option<String>,
    pub employment_type_name: Option<String>,
    pub employment_type_code: Option<String>,
    pub active: bool,

    // ===== 所属（ID と名称を常に対で保持）=====
    pub department_id: String,
    pub department_name: String,
    pub section_id: Option<String>,
    pub section_name: Option<String>,
    pub course_id: Option<String>,
    pub course_name: Option<String>,
}

impl EmployeeView {
    /// 所属ラベル（部 課 係 を空白区切りで連結）
    pub fn unit_label(&self) -> String {
        let mut parts = vec![self.department_name.as_str()];
        if let Some(s) = self.section_name.as_deref() {
            parts.push(s);
        }
        if let Some(c) = self.course_name.as_deref() {
            parts.push(c);
        }
        parts.join(" ")
    }
}

// ==========================================
// ProcessedEmployee - 取込中間レコード
// ==========================================
// 用途: 名簿1行から生成される実行スコープのレコード。
//       実行終了とともに破棄し、永続化しない
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedEmployee {
    // ===== 必須項目 =====
    pub employee_number: String,      // 社員番号
    pub name: String,                 // 氏名
    pub department_name: String,      // 部（所属1トークン目）

    // ===== 所属（任意階層）=====
    pub section_name: Option<String>, // 課
    pub course_name: Option<String>,  // 係
    pub affiliation_code: Option<String>, // 所属コード（階層コード派生元）

    // ===== 任意項目（正規化済）=====
    pub name_kana: Option<String>,    // フリガナ（全角カナ）
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position_name: String,        // 役職名（欠損時は既定値を補完）
    pub position_code: Option<String>,
    pub grade_name: Option<String>,
    pub grade_code: Option<String>,
    pub employment_type_name: Option<String>,
    pub employment_type_code: Option<String>,
    pub joined_on: Option<NaiveDate>,
    pub birth_date: Option<NaiveDate>,

    // ===== メタ情報 =====
    pub row_number: usize,            // 元ファイル内の行番号
}

impl ProcessedEmployee {
    /// 所属ラベル（部 課 係 を空白区切りで連結）
    pub fn unit_label(&self) -> String {
        let mut parts = vec![self.department_name.as_str()];
        if let Some(s) = self.section_name.as_deref() {
            parts.push(s);
        }
        if let Some(c) = self.course_name.as_deref() {
            parts.push(c);
        }
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_processed(dept: &str, section: Option<&str>, course: Option<&str>) -> ProcessedEmployee {
        ProcessedEmployee {
            employee_number: "E001".to_string(),
            name: "山田 太郎".to_string(),
            department_name: dept.to_string(),
            section_name: section.map(|s| s.to_string()),
            course_name: course.map(|s| s.to_string()),
            affiliation_code: None,
            name_kana: None,
            email: None,
            phone: None,
            position_name: "一般社員".to_string(),
            position_code: None,
            grade_name: None,
            grade_code: None,
            employment_type_name: None,
            employment_type_code: None,
            joined_on: None,
            birth_date: None,
            row_number: 1,
        }
    }

    #[test]
    fn test_unit_label_full_path() {
        let e = sample_processed("営業部", Some("第一課"), Some("販売係"));
        assert_eq!(e.unit_label(), "営業部 第一課 販売係");
    }

    #[test]
    fn test_unit_label_department_only() {
        let e = sample_processed("営業部", None, None);
        assert_eq!(e.unit_label(), "営業部");
    }
}
