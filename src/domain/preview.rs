// ==========================================
// 社員名簿同期システム - プレビュー／確定結果モデル
// ==========================================
// 用途: Reconciler の分類結果（書込前の差分提示）と
//       Committer の確定結果（統計）
// 鉄則: PreviewResult は副作用ゼロの純粋な値。
//       部分成功の形は存在しない（確定は全成功か全失敗）
// ==========================================

use crate::domain::employee::{EmployeeView, ProcessedEmployee};
use serde::{Deserialize, Serialize};

// ==========================================
// FieldChange - 項目レベル変更
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,               // 項目キー（snake_case）
    pub label: String,               // 表示ラベル（例: 役職）
    pub old_value: Option<String>,   // 旧値（欠損は None）
    pub new_value: Option<String>,   // 新値（欠損は None）
}

impl FieldChange {
    /// 監査向けの説明文（"<ラベル>: <旧> → <新>"）
    pub fn describe(&self) -> String {
        let old = self.old_value.as_deref().unwrap_or("（未設定）");
        let new = self.new_value.as_deref().unwrap_or("（未設定）");
        format!("{}: {} → {}", self.label, old, new)
    }
}

// ==========================================
// UpdatedEmployee - 項目更新として分類された社員
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatedEmployee {
    pub employee: ProcessedEmployee,
    pub changes: Vec<FieldChange>,   // 変更項目（入力順で安定）
}

// ==========================================
// TransferredEmployee - 異動として分類された社員
// ==========================================
// 鉄則: 所属変更は項目更新に優先する（他項目の変更は changes に併記）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferredEmployee {
    pub employee: ProcessedEmployee,
    pub old_unit: String,            // 旧所属ラベル
    pub new_unit: String,            // 新所属ラベル
    pub changes: Vec<FieldChange>,   // 所属以外も含む全変更項目
}

// ==========================================
// DuplicateExclusion - バッチ内重複による除外
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateExclusion {
    pub row_number: usize,                 // 除外された行番号
    pub employee_number: Option<String>,   // 除外行の社員番号
    pub retained_number: String,           // 採用した側の社員番号
    pub reason: String,                    // 除外理由
}

// ==========================================
// RowError - 行レベルエラー（非致命）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowError {
    pub row_number: usize,
    pub message: String,
}

// ==========================================
// PreviewResult - リコンサイル分類結果
// ==========================================
// 分割則: 取込行は {新規, 更新, 異動, 変更なし} のいずれか一つ、
//         在籍中の既存社員は {更新, 異動, 変更なし, 退職} のいずれか一つ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResult {
    pub new_employees: Vec<ProcessedEmployee>,
    pub updated: Vec<UpdatedEmployee>,
    pub transferred: Vec<TransferredEmployee>,
    pub retired: Vec<EmployeeView>,
    pub excluded_duplicates: Vec<DuplicateExclusion>,
    pub errors: Vec<RowError>,
    pub unchanged: usize,            // 変更なし件数（一覧には出さない）
}

impl PreviewResult {
    /// 書込対象の変更が一件もないか
    pub fn is_noop(&self) -> bool {
        self.new_employees.is_empty()
            && self.updated.is_empty()
            && self.transferred.is_empty()
            && self.retired.is_empty()
    }

    /// 簡易サマリ文を生成する
    pub fn summary_text(&self) -> String {
        let mut parts = vec![];

        if !self.new_employees.is_empty() {
            parts.push(format!("新規{}名", self.new_employees.len()));
        }
        if !self.updated.is_empty() {
            parts.push(format!("更新{}名", self.updated.len()));
        }
        if !self.transferred.is_empty() {
            parts.push(format!("異動{}名", self.transferred.len()));
        }
        if !self.retired.is_empty() {
            parts.push(format!("退職{}名", self.retired.len()));
        }
        if !self.excluded_duplicates.is_empty() {
            parts.push(format!("重複除外{}件", self.excluded_duplicates.len()));
        }
        if !self.errors.is_empty() {
            parts.push(format!("行エラー{}件", self.errors.len()));
        }

        if parts.is_empty() {
            "変更なし".to_string()
        } else {
            parts.join(", ")
        }
    }
}

// ==========================================
// RosterPreview - プレビュー応答
// ==========================================
// 用途: 確認画面への提示単位。確定時は records をそのまま渡す
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterPreview {
    pub batch_id: String,                  // 取込バッチ相関トークン
    pub organization_id: String,
    pub records: Vec<ProcessedEmployee>,   // 重複除外後の有効レコード
    pub preview: PreviewResult,
}

// ==========================================
// ImportStatistics - 確定統計
// ==========================================
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ImportStatistics {
    pub total_records: usize, // 確定対象レコード数
    pub created: usize,       // 新規登録数
    pub updated: usize,       // 更新数（異動・再入社を含む）
    pub skipped: usize,       // 部未解決などでスキップした数
    pub retired: usize,       // 退職化した数
}

// ==========================================
// HierarchyCreated - 階層ノード作成数
// ==========================================
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HierarchyCreated {
    pub departments: usize,
    pub sections: usize,
    pub courses: usize,
}

// ==========================================
// CommitSummary - 確定結果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitSummary {
    pub batch_id: String,
    pub message: String,
    pub statistics: ImportStatistics,
    pub hierarchy_created: HierarchyCreated,
}
