/// This module is for "real" OS-dependent features.
/// wasm builds will not be able to access this module, period,
/// since they cannot use the std::os module, or filesystem directly.

use std::{fs, io, path::Path};

pub fn mk_writable_dir(dirpath: &Path) -> io::Result<()> {
    fs::create_dir_all(dirpath)?;

    let mut perms = fs::metadata(dirpath)?.permissions();
    perms.set_readonly(false);
    #[cfg(unix)]
    {
        // Does not apply to Windows
        use std::os::unix::fs::PermissionsExt;
        perms.set_mode(0o700);
    }
    fs::set_permissions(dirpath, perms)
}
