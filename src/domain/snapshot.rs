// ==========================================
// 社員名簿同期システム - 組織スナップショット領域モデル
// ==========================================
// 用途: ある時点の組織階層全体の非正規化コピー。
//       取込とは独立に取得し、時系列のドリフト比較に使う
// 鉄則: 作成後は不変。取込処理の入力には使わない
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// OrganizationSnapshot - 組織スナップショット
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationSnapshot {
    pub snapshot_id: String,              // UUID
    pub organization_id: String,
    pub active_employee_count: i64,       // 在籍社員数（集計値）
    pub departments: Vec<DepartmentSnapshot>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentSnapshot {
    pub department_id: String,
    pub name: String,
    pub code: Option<String>,
    pub manager_employee_id: Option<String>,
    pub sections: Vec<SectionSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionSnapshot {
    pub section_id: String,
    pub name: String,
    pub code: Option<String>,
    pub manager_employee_id: Option<String>,
    pub courses: Vec<CourseSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseSnapshot {
    pub course_id: String,
    pub name: String,
    pub code: Option<String>,
    pub manager_employee_id: Option<String>,
}

impl OrganizationSnapshot {
    /// 部 ID の集合
    pub fn department_ids(&self) -> BTreeSet<String> {
        self.departments.iter().map(|d| d.department_id.clone()).collect()
    }

    /// 課 ID の集合（全部署横断）
    pub fn section_ids(&self) -> BTreeSet<String> {
        self.departments
            .iter()
            .flat_map(|d| d.sections.iter().map(|s| s.section_id.clone()))
            .collect()
    }

    /// 係 ID の集合（全部署横断）
    pub fn course_ids(&self) -> BTreeSet<String> {
        self.departments
            .iter()
            .flat_map(|d| d.sections.iter())
            .flat_map(|s| s.courses.iter().map(|c| c.course_id.clone()))
            .collect()
    }
}

// ==========================================
// SnapshotDiff - スナップショット差分
// ==========================================
// 用途: 2時点間の組織ドリフト報告（純粋な集合差分）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDiff {
    pub added_departments: Vec<String>,   // 新時点にのみ存在する部 ID
    pub removed_departments: Vec<String>, // 旧時点にのみ存在する部 ID
    pub added_sections: Vec<String>,
    pub removed_sections: Vec<String>,
    pub added_courses: Vec<String>,
    pub removed_courses: Vec<String>,
    pub employee_count_delta: i64,        // 在籍社員数の符号付き増減
}

impl SnapshotDiff {
    /// 差分が存在するか
    pub fn has_drift(&self) -> bool {
        !self.added_departments.is_empty()
            || !self.removed_departments.is_empty()
            || !self.added_sections.is_empty()
            || !self.removed_sections.is_empty()
            || !self.added_courses.is_empty()
            || !self.removed_courses.is_empty()
            || self.employee_count_delta != 0
    }

    /// 簡易サマリ文を生成する
    pub fn summary_text(&self) -> String {
        let mut parts = vec![];

        if !self.added_departments.is_empty() {
            parts.push(format!("部 +{}", self.added_departments.len()));
        }
        if !self.removed_departments.is_empty() {
            parts.push(format!("部 -{}", self.removed_departments.len()));
        }
        if !self.added_sections.is_empty() {
            parts.push(format!("課 +{}", self.added_sections.len()));
        }
        if !self.removed_sections.is_empty() {
            parts.push(format!("課 -{}", self.removed_sections.len()));
        }
        if !self.added_courses.is_empty() {
            parts.push(format!("係 +{}", self.added_courses.len()));
        }
        if !self.removed_courses.is_empty() {
            parts.push(format!("係 -{}", self.removed_courses.len()));
        }
        if self.employee_count_delta != 0 {
            parts.push(format!("在籍 {:+}", self.employee_count_delta));
        }

        if parts.is_empty() {
            "ドリフトなし".to_string()
        } else {
            parts.join(", ")
        }
    }
}
