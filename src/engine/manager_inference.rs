// ==========================================
// 社員名簿同期システム - 管理者推定ポリシー
// ==========================================
// 責務: 役職名のキーワード一致による組織単位の管理者推定
// 方針: レベル別の順序付きキーワード表に基づく表駆動の分類。
//       表の差し替えだけでポリシーを変更でき、Committer の
//       トランザクションロジックには触れない
// 注意: 一意性を保証するヒューリスティックではない。
//       キーワード順 → 列挙順の先勝ちで決める
// ==========================================

use crate::config::ManagerKeywordTable;
use crate::domain::employee::EmployeeView;
use crate::domain::types::OrgLevel;

/// 組織単位の管理者を役職名から推定する
///
/// # 引数
/// - `table`: レベル別キーワード表（優先順）
/// - `level`: 対象の階層レベル
/// - `members`: 当該単位に所属する在籍社員（列挙順で安定）
///
/// # 戻り値
/// - Some(employee_id): 最初に一致した社員
/// - None: 一致なし
pub fn infer_manager(
    table: &ManagerKeywordTable,
    level: OrgLevel,
    members: &[&EmployeeView],
) -> Option<String> {
    for keyword in table.keywords_for(level) {
        for member in members {
            if let Some(position) = member.position_name.as_deref() {
                if position.contains(keyword.as_str()) {
                    return Some(member.employee_id.clone());
                }
            }
        }
    }
    None
}
