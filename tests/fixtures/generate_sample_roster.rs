// ==========================================
// サンプル名簿 CSV 生成ツール
// ==========================================
// 用途: 動作確認用の名簿ファイルを生成する
// 実行: cargo run --bin generate_sample_roster [出力パス]
// ==========================================

use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_roster.csv".to_string());

    let mut writer = csv::Writer::from_path(&output_path)?;

    writer.write_record([
        "社員番号",
        "氏名",
        "フリガナ",
        "メールアドレス",
        "電話番号",
        "所属",
        "所属コード",
        "役職",
        "役職コード",
        "資格等級",
        "等級コード",
        "雇用区分",
        "雇用区分コード",
        "入社日",
        "生年月日",
    ])?;

    let rows = [
        ["E0001", "山田 太郎", "ﾔﾏﾀﾞ ﾀﾛｳ", "taro.yamada@example.co.jp", "03-1234-5601",
         "営業部 第一営業課 販売係", "1010101", "部長", "P01", "参与", "G07", "正社員", "K01", "H20.4.1", "1975/6/15"],
        ["E0002", "佐藤 花子", "ｻﾄｳ ﾊﾅｺ", "hanako.sato@example.co.jp", "03-1234-5602",
         "営業部 第一営業課 販売係", "1010101", "課長", "P03", "主査", "G05", "正社員", "K01", "H28.4.1", "1985/2/3"],
        ["E0003", "鈴木 次郎", "ｽｽﾞｷ ｼﾞﾛｳ", "jiro.suzuki@example.co.jp", "03-1234-5603",
         "営業部 第一営業課 販売係", "1010101", "係長", "P05", "主事", "G03", "正社員", "K01", "R2.4.1", "1992/11/20"],
        ["E0004", "高橋 三郎", "ﾀｶﾊｼ ｻﾌﾞﾛｳ", "saburo.takahashi@example.co.jp", "03-1234-5604",
         "営業部 第二営業課", "10102", "", "", "主事補", "G02", "契約社員", "K02", "R5.4.1", "1998/8/8"],
        ["E0005", "田中 美咲", "ﾀﾅｶ ﾐｻｷ", "misaki.tanaka@example.co.jp", "03-1234-5605",
         "総務部 人事課", "20201", "課長", "P03", "主査", "G05", "正社員", "K01", "2015年4月1日", "1988/3/30"],
        ["E0006", "伊藤 健一", "ｲﾄｳ ｹﾝｲﾁ", "kenichi.ito@example.co.jp", "03-1234-5606",
         "総務部", "202", "本部長", "P00", "理事", "G08", "正社員", "K01", "S63.4.1", "1965/12/1"],
    ];

    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    println!("サンプル名簿を生成しました: {output_path}");
    Ok(())
}
