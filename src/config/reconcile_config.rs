// ==========================================
// 社員名簿同期システム - リコンサイル設定
// ==========================================
// 責務: 管理者推定キーワード表・所属コード接頭辞長・既定役職名
// 形式: JSON ファイル（全項目に既定値あり。ファイル欠損時は既定で動作）
// ==========================================

use crate::domain::types::OrgLevel;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ==========================================
// ManagerKeywordTable - 管理者推定キーワード表
// ==========================================
// 用途: 階層レベルごとの役職名キーワード（優先順）。
//       表の差し替えだけで推定方針を変更できる
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerKeywordTable {
    pub department: Vec<String>, // 部レベル（最上位の役職名）
    pub section: Vec<String>,    // 課レベル
    pub course: Vec<String>,     // 係レベル（最下位の管理職名）
}

impl Default for ManagerKeywordTable {
    fn default() -> Self {
        Self {
            department: vec!["本部長".to_string(), "部長".to_string()],
            section: vec!["課長".to_string(), "マネージャー".to_string()],
            course: vec!["係長".to_string(), "主任".to_string()],
        }
    }
}

impl ManagerKeywordTable {
    /// 指定レベルのキーワード一覧（優先順）
    pub fn keywords_for(&self, level: OrgLevel) -> &[String] {
        match level {
            OrgLevel::Department => &self.department,
            OrgLevel::Section => &self.section,
            OrgLevel::Course => &self.course,
        }
    }
}

// ==========================================
// ReconcileConfig - リコンサイル設定
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// 役職欠損時に補完する既定役職名
    pub default_position_name: String,

    /// 部コードに使う所属コード接頭辞の長さ
    pub department_code_len: usize,

    /// 課コードに使う所属コード接頭辞の長さ（係は全桁を使う）
    pub section_code_len: usize,

    /// 管理者推定キーワード表
    pub manager_keywords: ManagerKeywordTable,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            default_position_name: "一般社員".to_string(),
            department_code_len: 3,
            section_code_len: 5,
            manager_keywords: ManagerKeywordTable::default(),
        }
    }
}

impl ReconcileConfig {
    /// JSON ファイルから読み込む。ファイルが存在しない場合は既定値を返す
    ///
    /// # 引数
    /// - `path`: 設定ファイルパス
    ///
    /// # 戻り値
    /// - Ok(ReconcileConfig): 読み込み成功または既定値
    /// - Err: ファイルは存在するが JSON として不正
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// 所属コードから指定レベルの短縮コードを派生する
    ///
    /// # 規則
    /// - 部: 先頭 department_code_len 桁
    /// - 課: 先頭 section_code_len 桁
    /// - 係: 全桁
    /// - 所属コード欠損時は None
    pub fn derive_unit_code(&self, level: OrgLevel, affiliation_code: Option<&str>) -> Option<String> {
        let code = affiliation_code?.trim();
        if code.is_empty() {
            return None;
        }
        let len = match level {
            OrgLevel::Department => self.department_code_len,
            OrgLevel::Section => self.section_code_len,
            OrgLevel::Course => return Some(code.to_string()),
        };
        Some(code.chars().take(len).collect())
    }
}
