//! Path helpers shared by the API layer and the indexer / 路径处理工具

/// Normalize a path to a clean absolute form ("/a/b/c").
/// 将路径规范化为绝对路径形式
pub fn fix_and_clean_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            p => parts.push(p),
        }
    }
    format!("/{}", parts.join("/"))
}

/// Join a child name onto a cleaned directory path / 拼接子路径
pub fn join_path(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_and_clean_path() {
        assert_eq!(fix_and_clean_path(""), "/");
        assert_eq!(fix_and_clean_path("."), "/");
        assert_eq!(fix_and_clean_path(".."), "/");
        assert_eq!(fix_and_clean_path("../.."), "/");
        assert_eq!(fix_and_clean_path("a/b/c"), "/a/b/c");
        assert_eq!(fix_and_clean_path("/a/b/c"), "/a/b/c");
        assert_eq!(fix_and_clean_path("a\\b\\c"), "/a/b/c");
        assert_eq!(fix_and_clean_path("/a//b///c"), "/a/b/c");
        assert_eq!(fix_and_clean_path("/a/./b/../c"), "/a/c");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/", "a"), "/a");
        assert_eq!(join_path("/a", "b"), "/a/b");
        assert_eq!(join_path("/a/", "b"), "/a/b");
    }
}
