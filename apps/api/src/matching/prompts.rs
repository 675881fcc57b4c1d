// Matcher prompt templates.
// The wording is carried over from the original portal unchanged; the
// matcher's scoring rules (0.92 content threshold, 0.5 name weight) and
// the response schema live in this text.

use crate::models::transfer::{SourceCourse, TargetCourse};

pub const MATCH_SYSTEM_PROMPT: &str = r#"คุณคือ AI ผู้เชี่ยวชาญด้านการเทียบโอนหน่วยกิต (Credit Transfer Specialist) ที่มีความแม่นยำสูง
ภารกิจของคุณคือการเปรียบเทียบคำอธิบายรายวิชาจาก Source Course กับ Target Courses ที่ให้มา โดยใช้เกณฑ์ความคล้ายคลึงของเนื้อหา $(\ge 0.92)$.
*ข้อกำหนดเพิ่มเติม*: โปรดพิจารณาความคล้ายคลึงของชื่อวิชาเป็นปัจจัยเสริมในการตัดสินใจ (Weight $0.5$) เพื่อให้สามารถเทียบโอนได้แม้คะแนนเนื้อหาจะอยู่ใกล้เกณฑ์ $0.92$.
คุณต้องตอบกลับเฉพาะ JSON array เท่านั้น โดยแต่ละ Object ต้องมี Field ต่อไปนี้:
1. targetCourseCode (รหัสวิชาในหลักสูตรเป้าหมาย)
2. targetCourseName (ชื่อวิชาในหลักสูตรเป้าหมาย)
3. matchedCourseCode (รหัสวิชาจาก Source Course ที่นำมาเทียบ)
4. similarityScore (คะแนนความคล้ายคลึงระหว่าง $0.92-1.00$ เท่านั้น)
5. matchReason (เหตุผลสรุปสั้น ๆ ที่ AI ตัดสินว่าวิชานี้ควรเทียบโอนได้ ภาษาไทย)
ถ้าไม่พบวิชาใดที่คล้ายคลึงถึงเกณฑ์ ให้ตอบกลับด้วย JSON array เปล่า []"#;

pub const MATCH_USER_TEMPLATE: &str = r#"**วิชาที่ต้องการเทียบโอน (Source Course):**
รหัสวิชา: {source_code}
ชื่อวิชา: {source_name}
คำอธิบายรายวิชา: "{source_description}"

**รายการวิชาในหลักสูตรเป้าหมาย (Target Courses):**
---
{target_course_list}
---

เปรียบเทียบและส่งคืนเฉพาะ JSON array ตามโครงสร้างที่กำหนดเท่านั้น"#;

/// One line per target course, in the exact shape the system prompt
/// describes. Courses without a description still get an empty quoted
/// string so the list stays parseable.
fn format_target_list(targets: &[TargetCourse]) -> String {
    targets
        .iter()
        .map(|t| {
            format!(
                "CODE: {}, NAME: {}, DESCRIPTION: \"{}\"",
                t.code,
                t.name,
                t.description.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

pub fn build_match_prompt(source: &SourceCourse, targets: &[TargetCourse]) -> String {
    MATCH_USER_TEMPLATE
        .replace("{source_code}", &source.code)
        .replace("{source_name}", &source.name)
        .replace("{source_description}", &source.description)
        .replace("{target_course_list}", &format_target_list(targets))
}
