//! System prompt assembly.

use goclaw_core::context::{build_context_prompt, ContextFile};

/// Built-in instructions telling the model how to use its tools.
pub const BASE_SYSTEM_PROMPT: &str = "你是一个 AI 助手，拥有文件操作和命令执行能力。

可用工具：
- read_file: 读取文件内容
- write_file: 写入文件
- list_dir: 列出目录内容
- exec_command: 执行 shell 命令

重要规则：
1. 当用户请求读取、写入、列出文件或执行命令时，必须调用相应的工具
2. 不要猜测文件内容，使用 read_file 工具读取
3. 在总结文件操作结果时要准确详细
4. 执行命令前要确认命令的安全性";

/// Base prompt, followed by the workspace context fragment when there is one.
pub fn build_system_prompt(base: &str, files: &[ContextFile]) -> String {
    let context = build_context_prompt(files);
    if context.is_empty() {
        base.to_string()
    } else {
        format!("{base}\n\n{context}")
    }
}
