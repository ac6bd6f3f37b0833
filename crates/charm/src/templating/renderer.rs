/// INI 渲染

use common::sections::Sections;
use common::{Error, Result};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// 将配置段渲染为 INI 文本，段按名称排序，段内键保持原有顺序
pub fn render_sections(sections: &Sections) -> String {
    let mut out = String::new();
    for (index, (name, entries)) in sections.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(&format!("[{}]\n", name));
        for (key, value) in entries {
            out.push_str(&format!("{} = {}\n", key, value));
        }
    }
    out
}

/// 写入文件，必要时创建父目录
pub async fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::File(format!("无法创建目录 {:?}: {}", parent, e)))?;
    }

    debug!("写入文件 {:?}", path);
    fs::write(path, content)
        .await
        .map_err(|e| Error::File(format!("无法写入 {:?}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::SectionValue;
    use std::collections::BTreeMap;

    #[test]
    fn test_render_sections() {
        let sections: Sections = BTreeMap::from([
            (
                "global".to_string(),
                vec![
                    ("auth_supported".to_string(), SectionValue::from("cephx")),
                    ("mon host".to_string(), SectionValue::from("10.0.0.1 10.0.0.2")),
                ],
            ),
            (
                "client".to_string(),
                vec![("rbd_exclusive_cinder_pool".to_string(), SectionValue::Bool(true))],
            ),
        ]);

        assert_eq!(
            render_sections(&sections),
            "[client]\nrbd_exclusive_cinder_pool = True\n\n[global]\nauth_supported = cephx\nmon host = 10.0.0.1 10.0.0.2\n"
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_sections(&Sections::new()), "");
    }

    #[tokio::test]
    async fn test_write_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("var/lib/charm/cinder-ceph/ceph.conf");
        write_file(&path, "[global]\n").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[global]\n");
    }
}
