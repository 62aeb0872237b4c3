//! 文本解析工具
//!
//! 页面只以自由文本的形式暴露分页区间、评分数量、热门程度等信息，
//! 这里集中做解析，方便单独测试。

use std::sync::OnceLock;

use regex::Regex;

fn integer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("静态正则"))
}

fn place_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/place/([^/]*)").expect("静态正则"))
}

fn occupancy_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*%").expect("静态正则"))
}

fn background_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"url\(["']?([^"')]*)["']?\)"#).expect("静态正则"))
}

/// 把文本转义成键：`keep` 接受的字符原样保留，其余字符按 UTF-8 字节写成 `%XX`
///
/// `%` 总是被转义，所以不同的输入一定得到不同的键。
pub fn escape_key(raw: &str, keep: impl Fn(char) -> bool) -> String {
    let mut escaped = String::with_capacity(raw.len());
    let mut buf = [0u8; 4];
    for c in raw.chars() {
        if c != '%' && keep(c) {
            escaped.push(c);
        } else {
            for byte in c.encode_utf8(&mut buf).bytes() {
                escaped.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    escaped
}

/// 从分页文本中取出前两个整数 `(from, to)`
///
/// 例如 "显示第 21–40 个结果" → `(21, 40)`；数字之间的分隔符不限。
pub fn parse_pagination_range(text: &str) -> Option<(u64, u64)> {
    let mut numbers = integer_re()
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<u64>().ok());
    let from = numbers.next()?;
    let to = numbers.next()?;
    Some((from, to))
}

/// 取文本中的第一个整数
pub fn parse_first_int(text: &str) -> Option<u64> {
    integer_re()
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

/// 从详情页地址中提取稳定的地点标识：`.../place/<token>/...`
pub fn extract_place_token(url: &str) -> Option<String> {
    place_token_re()
        .captures(url)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|token| !token.is_empty())
}

/// 协议相对地址补全为 https
pub fn normalize_image_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}

/// 从 `background-image: url("...")` 样式中取出图片地址
pub fn parse_background_image_url(style: &str) -> Option<String> {
    background_url_re()
        .captures(style)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim())
        .filter(|url| !url.is_empty())
        .map(normalize_image_url)
}

/// 从无障碍标签中解析热门程度百分比，例如 "Usually 45 % busy at 6 PM."
pub fn parse_occupancy_percent(label: &str) -> Option<u8> {
    occupancy_re()
        .captures(label)
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse::<u16>().ok())
        .map(|value| value.min(100) as u8)
}

/// 从小时标签推出起始小时（24 小时制）
///
/// "6a" → 6，"3p" → 15，"12p" → 12，"12a" → 0，"18" → 18
pub fn start_hour_from_label(label: &str) -> Option<u8> {
    let hour = parse_first_int(label)?;
    if hour > 24 {
        return None;
    }
    let hour = hour as u8;
    let lower = label.to_lowercase();
    let is_afternoon = lower.contains('p');
    let is_morning = lower.contains('a');
    Some(match (is_afternoon, is_morning, hour) {
        (true, _, h) if h < 12 => h + 12,
        (false, true, 12) => 0,
        (_, _, h) => h % 24,
    })
}

/// 直方图中第 `bar_index` 根柱子对应的小时，跨过午夜时回绕
pub fn histogram_hour(start_hour: u8, bar_index: usize) -> u8 {
    ((start_hour as usize + bar_index) % 24) as u8
}
