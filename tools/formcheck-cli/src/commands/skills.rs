//! List registered exercises.

use formcheck_analysis_core::SkillKind;

pub fn run() -> anyhow::Result<()> {
    println!("Registered exercises:");
    for kind in SkillKind::ALL {
        let skill = kind.skill();
        println!();
        println!("  {} ({})", kind, skill.display_name());
        for slot in skill.upload_spec() {
            println!(
                "    --clip {}=<PATH>  {}{}",
                slot.key,
                slot.label,
                if slot.required { " [required]" } else { "" }
            );
            println!("        {}", slot.instruction);
        }
    }
    Ok(())
}
