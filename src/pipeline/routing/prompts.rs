use crate::models::ImageType;

/// Zero-shot text prompts per modality. The first entry is the primary prompt.
pub const PROMPTS: [(ImageType, [&str; 3]); 3] = [
    (
        ImageType::SkinLesion,
        [
            "a dermoscopic image of a skin lesion",
            "a close-up photograph of a mole or skin growth",
            "a dermatology clinical image of skin",
        ],
    ),
    (
        ImageType::ChestXray,
        [
            "a chest x-ray radiograph",
            "a frontal chest radiograph showing lungs and heart",
            "a medical x-ray image of the thorax",
        ],
    ),
    (
        ImageType::Fundus,
        [
            "a fundus photograph of the retina",
            "an ophthalmoscopic image of the eye retina",
            "a retinal fundus image showing blood vessels and optic disc",
        ],
    ),
];

/// One prompt per modality, in `ImageType::MODALITIES` order.
pub fn primary_prompts() -> Vec<&'static str> {
    PROMPTS.iter().map(|(_, prompts)| prompts[0]).collect()
}

/// Every prompt paired with its modality, grouped by modality.
pub fn ensemble_prompts() -> Vec<(ImageType, &'static str)> {
    PROMPTS
        .iter()
        .flat_map(|(ty, prompts)| prompts.iter().map(move |p| (*ty, *p)))
        .collect()
}
