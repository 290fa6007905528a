// ==========================================
// 社員名簿同期システム - 名簿取込 Trait
// ==========================================
// 責務: 名簿取込インタフェースの定義（実装を含まない）
// 契約: プレビューは副作用ゼロ。確定は明示的な呼び出しでのみ実行
// ==========================================

use crate::domain::employee::ProcessedEmployee;
use crate::domain::preview::{CommitSummary, RosterPreview};
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

// ==========================================
// RosterImporter Trait
// ==========================================
// 用途: 名簿取込の主インタフェース
// 実装者: RosterImporterImpl
#[async_trait]
pub trait RosterImporter: Send + Sync {
    /// 名簿ファイル群を読み込み、変更プレビューを生成する（書込なし）
    ///
    /// # 引数
    /// - `organization_id`: 対象組織（明示必須）
    /// - `file_paths`: CSV / Excel ファイルパス（複数可。1バッチに結合）
    ///
    /// # 戻り値
    /// - Ok(RosterPreview): バッチ ID・有効レコード・分類結果
    /// - Err: ファイル読込エラー、組織未存在
    ///
    /// # 処理段階
    /// 1. ファイル解析（複数ファイルは並行読込）
    /// 2. 行解釈・正規化（行エラーは収集して継続）
    /// 3. バッチ内重複除外
    /// 4. 永続状態との分類（新規 / 更新 / 異動 / 変更なし / 退職）
    async fn preview_files<P: AsRef<Path> + Send + Sync>(
        &self,
        organization_id: &str,
        file_paths: Vec<P>,
    ) -> ImportResult<RosterPreview>;

    /// 受理済みバッチを1トランザクションで確定する
    ///
    /// # 引数
    /// - `records`: プレビューで得た有効レコード（重複除外済み）
    /// - `actor`: 操作者（監査帰属）
    /// - `batch_id`: プレビューで発行されたバッチ ID
    ///
    /// # 失敗時の挙動
    /// トランザクション全体がロールバックされ、部分状態は残らない。
    /// 同一バッチの再送は安全（全手順が冪等）
    async fn commit(
        &self,
        organization_id: &str,
        records: &[ProcessedEmployee],
        actor: &str,
        batch_id: &str,
    ) -> ImportResult<CommitSummary>;

    /// プレビューと確定を一括実行する（非対話ユース向け）
    async fn import_files<P: AsRef<Path> + Send + Sync>(
        &self,
        organization_id: &str,
        file_paths: Vec<P>,
        actor: &str,
    ) -> ImportResult<(RosterPreview, CommitSummary)>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: ファイル解析インタフェース（段階 1）
// 実装者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// ファイルを原始行レコード（HashMap<列名, 値>）へ解析する
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<HashMap<String, String>>>;
}
