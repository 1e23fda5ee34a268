//! `goclaw init`: identity questionnaire.
//!
//! Writes `IDENTITY.md` into the workspace and, when a personality is given,
//! appends it to `SOUL.md`.

use crate::runtime::{load_config, CliResult};
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use goclaw_core::context::{IDENTITY_FILE, SOUL_FILE};
use std::path::{Path, PathBuf};

const STYLES: [&str; 3] = ["简洁", "详细", "幽默"];
const STYLE_CHOICES: [&str; 3] = [
    "简洁 - 直接回答，避免冗余",
    "详细 - 提供完整的解释和背景",
    "幽默 - 轻松诙谐的表达方式",
];

/// Answers collected by the questionnaire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityAnswers {
    pub name: String,
    pub occupation: String,
    pub location: String,
    pub timezone: String,
    pub interests: String,
    pub expertise: String,
    pub style: String,
    pub tech_level: String,
    pub work_hours: String,
    pub tools: String,
    pub personality: String,
}

pub async fn run(config_path: Option<&Path>) -> CliResult {
    let workspace = load_config(config_path)?.memory.workspace;

    println!("{}", style("╔════════════════════════════════════════╗").cyan());
    println!("{}", style("║        GoClaw 身份配置向导              ║").cyan());
    println!("{}", style("╚════════════════════════════════════════╝").cyan());
    println!("\n这将帮助创建个性化的身份配置文件。\n");

    let answers = ask()?;

    println!("\n{}", style("════════════════════════════════════════").yellow());
    println!("配置预览:");
    for (key, value) in answers.preview() {
        if !value.is_empty() {
            println!("  {key}: {value}");
        }
    }
    println!("{}", style("════════════════════════════════════════").yellow());

    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("确认生成配置文件？")
        .default(true)
        .interact()?;
    if !confirmed {
        println!("{}", style("已取消。").yellow());
        return Ok(());
    }

    let (identity_path, soul_path) = write_identity(&workspace, &answers).await?;

    println!("\n{}", style("✓ 配置文件已生成！").green());
    println!("\n文件位置:");
    println!("  - {}", identity_path.display());
    println!("  - {}", soul_path.display());
    println!("\n你可以随时手动编辑这些文件来调整我的个性。");
    println!("\n现在可以开始对话了：");
    println!("{}\n", style("  goclaw chat").cyan());
    Ok(())
}

fn ask() -> CliResult<IdentityAnswers> {
    let theme = ColorfulTheme::default();
    let text = |prompt: &str| -> Result<String, dialoguer::Error> {
        Input::<String>::with_theme(&theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map(|s| s.trim().to_string())
    };

    println!("{}", style("## 基本信息").yellow());
    let name = text("你的名字")?;
    let occupation = text("你的职业")?;
    let location = text("你所在的城市/地区")?;
    let timezone = text("你的时区 (例如: Asia/Shanghai)")?;

    println!("\n{}", style("## 兴趣与专长").yellow());
    let interests = text("兴趣爱好 (用逗号分隔)")?;
    let expertise = text("专长技能 (用逗号分隔)")?;

    println!("\n{}", style("## 沟通偏好").yellow());
    let style_idx = Select::with_theme(&theme)
        .with_prompt("选择回复风格")
        .items(&STYLE_CHOICES)
        .default(0)
        .interact()?;
    let tech_level = text("技术深度偏好 (高/中/低, 默认: 中)")?;

    println!("\n{}", style("## 工作习惯").yellow());
    let work_hours = text("工作时间 (例如: 9:00-18:00)")?;
    let tools = text("常用工具 (用逗号分隔)")?;

    println!("\n{}", style("## 个性特征 (可选)").yellow());
    let personality = text("个性特点描述 (可选，按回车跳过)")?;

    Ok(IdentityAnswers {
        name,
        occupation,
        location,
        timezone,
        interests,
        expertise,
        style: STYLES.get(style_idx).copied().unwrap_or(STYLES[0]).to_string(),
        tech_level: if tech_level.is_empty() { "中".into() } else { tech_level },
        work_hours,
        tools,
        personality,
    })
}

impl IdentityAnswers {
    fn preview(&self) -> [(&'static str, &str); 11] {
        [
            ("name", self.name.as_str()),
            ("occupation", self.occupation.as_str()),
            ("location", self.location.as_str()),
            ("timezone", self.timezone.as_str()),
            ("interests", self.interests.as_str()),
            ("expertise", self.expertise.as_str()),
            ("style", self.style.as_str()),
            ("techLevel", self.tech_level.as_str()),
            ("workHours", self.work_hours.as_str()),
            ("tools", self.tools.as_str()),
            ("personality", self.personality.as_str()),
        ]
    }

    /// Render the `IDENTITY.md` document.
    pub fn to_markdown(&self) -> String {
        format!(
            "# 身份档案\n\
             \n\
             这是 GoClaw 的身份文件，记录了关于你的重要信息。\n\
             \n\
             ## 基本信息\n\
             \n\
             - **姓名**: {}\n\
             - **职业**: {}\n\
             - **位置**: {}\n\
             - **时区**: {}\n\
             \n\
             ## 兴趣与专长\n\
             \n\
             - **兴趣**: {}\n\
             - **专长**: {}\n\
             \n\
             ## 沟通偏好\n\
             \n\
             - **语言**: 中文\n\
             - **回复风格**: {}\n\
             - **技术深度**: {} - 对技术细节的偏好程度\n\
             \n\
             ## 工作习惯\n\
             \n\
             - **工作时间**: {}\n\
             - **常用工具**: {}\n\
             \n\
             ## 个性特征\n\
             \n\
             {}\n\
             \n\
             ---\n\
             \n\
             *此文件由 goclaw init 生成，可以随时手动编辑。*",
            self.name,
            self.occupation,
            self.location,
            self.timezone,
            self.interests,
            self.expertise,
            self.style,
            self.tech_level,
            self.work_hours,
            self.tools,
            self.personality,
        )
    }
}

/// Write `IDENTITY.md` (replacing it) and append the personality to `SOUL.md`.
///
/// Returns the two file paths.
pub async fn write_identity(workspace: &Path, answers: &IdentityAnswers) -> CliResult<(PathBuf, PathBuf)> {
    tokio::fs::create_dir_all(workspace)
        .await
        .map_err(|e| format!("创建 workspace 目录失败: {e}"))?;

    let identity_path = workspace.join(IDENTITY_FILE);
    tokio::fs::write(&identity_path, answers.to_markdown())
        .await
        .map_err(|e| format!("写入 IDENTITY.md 失败: {e}"))?;

    let soul_path = workspace.join(SOUL_FILE);
    if !answers.personality.is_empty() {
        let mut soul = match tokio::fs::read_to_string(&soul_path).await {
            Ok(existing) => existing,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(format!("读取 SOUL.md 失败: {e}").into()),
        };
        soul.push_str(&format!("\n## 用户自定义个性\n\n{}\n", answers.personality));
        tokio::fs::write(&soul_path, soul)
            .await
            .map_err(|e| format!("更新 SOUL.md 失败: {e}"))?;
    }

    tracing::info!(workspace = %workspace.display(), "Identity files written");
    Ok((identity_path, soul_path))
}
