use cfg_aliases::cfg_aliases;

fn main() {
    cfg_aliases! {
        rustcrypto_key_agreement_base: {
            all(
                feature = "rustcrypto-ecdh",
                feature = "rustcrypto-hkdf"
            )
        },
        rustcrypto_base: {
            any(
                rustcrypto_key_agreement_base
            )
        },
    }
}
