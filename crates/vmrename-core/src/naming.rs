use crate::{CoreError, Result};

pub const MAX_VM_NAME_LEN: usize = 64;

/// Azure resource-name rules for `Microsoft.Compute/virtualMachines`.
pub fn validate_vm_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CoreError::InvalidName("VM name cannot be empty".to_string()));
    }

    if name.len() > MAX_VM_NAME_LEN {
        return Err(CoreError::InvalidName(format!(
            "VM name '{name}' exceeds {MAX_VM_NAME_LEN} characters"
        )));
    }

    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(CoreError::InvalidName(format!(
            "VM name '{name}' contains invalid character '{bad}'"
        )));
    }

    if !name.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err(CoreError::InvalidName(format!(
            "VM name '{name}' must start with a letter or digit"
        )));
    }

    if name.ends_with('-') || name.ends_with('.') {
        return Err(CoreError::InvalidName(format!(
            "VM name '{name}' cannot end with '-' or '.'"
        )));
    }

    Ok(())
}
